use lingo_types::language::LanguageCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Translation for {0} needs both title and description")]
    IncompleteTranslation(LanguageCode),
}

impl Error {
    /// Insert or update hit a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::DatabaseError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::RecordNotFound(_) | Error::DatabaseError(sqlx::Error::RowNotFound)
        )
    }
}
