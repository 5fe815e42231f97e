use clap::Args;
use garde::Validate as _;
use lingo_dal::user::CreateUser;
use lingo_types::{claim::Role, config::BackendConfig, general::ValidEmail};
use tracing::info;

use crate::commands::{create_user_repository, Executor};

#[derive(Args, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(long, help = "First name")]
    first_name: Option<String>,
    #[arg(long, help = "Last name")]
    last_name: Option<String>,
    #[arg(short, long, help = "User email, used as login")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password")]
    pub password: String,
    #[arg(long, help = "Phone number")]
    phone: Option<String>,
    #[arg(short, long, default_value = "user", help = "Role of the user, user or admin")]
    pub role: Role,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let new_user = CreateUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            phone: self.phone,
            role: self.role,
        };
        new_user.validate()?;
        let repository = create_user_repository(&self.backend).await?;
        let user = repository.create(new_user).await?;
        info!("Created user {} with id {}", user.email, user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        cmd: CreateUserCmd,
    }

    #[tokio::test]
    async fn test_create_admin() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "lingo-cli",
            "--data-dir",
            &data_dir,
            "--email",
            "Admin@Example.com",
            "--password",
            "password123",
            "--role",
            "admin",
        ])
        .unwrap();
        let backend = cli.cmd.backend.clone();
        cli.cmd.run().await.unwrap();

        let repository = create_user_repository(&backend).await.unwrap();
        let user = repository.find_by_email("admin@example.com").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        repository
            .check_password("admin@example.com", "password123")
            .await
            .unwrap();
    }

    #[test]
    fn test_invalid_email_rejected() {
        let res = Cli::try_parse_from([
            "lingo-cli",
            "--data-dir",
            "/tmp",
            "--email",
            "admin",
            "--password",
            "password123",
        ]);
        assert!(res.is_err());
    }
}
