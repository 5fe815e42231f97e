use clap::Parser;
use std::{fs, path::PathBuf};

/// Storage related settings shared by the server and the CLI.
#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "LINGO_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/lingo.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "LINGO_DATA_DIR",
        help = "Data directory (database, token secret), default is system default like ~/.local/share/lingo",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

pub fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("lingo"))
        .unwrap_or_else(|| PathBuf::from("lingo"))
        .to_string_lossy()
        .to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Creates data directory if missing.
    pub fn ensure_data_dir(&self) -> std::io::Result<PathBuf> {
        let dir = self.data_dir();
        if !fs::exists(&dir)? {
            fs::create_dir_all(&dir)?;
        } else if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.data_dir),
            ));
        }
        Ok(dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/lingo.db", self.data_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_default() {
        let config = BackendConfig::try_parse_from(["lingo", "--data-dir", "/tmp/lingo-test"]).unwrap();
        assert_eq!(config.database_url(), "sqlite:///tmp/lingo-test/lingo.db");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/lingo-test"));
    }

    #[test]
    fn test_ensure_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let data_dir = dir.to_string_lossy().to_string();
        let config = BackendConfig::try_parse_from(["lingo", "--data-dir", &data_dir]).unwrap();
        assert_eq!(config.ensure_data_dir().unwrap(), dir);
        assert!(dir.is_dir());
        // second call keeps existing directory
        assert_eq!(config.ensure_data_dir().unwrap(), dir);
    }

    #[test]
    fn test_data_dir_is_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("data");
        fs::write(&file, b"").unwrap();
        let data_dir = file.to_string_lossy().to_string();
        let config = BackendConfig::try_parse_from(["lingo", "--data-dir", &data_dir]).unwrap();
        assert!(config.ensure_data_dir().is_err());
    }

    #[test]
    fn test_database_url_explicit() {
        let config = BackendConfig::try_parse_from([
            "lingo",
            "--data-dir",
            "/tmp/lingo-test",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}
