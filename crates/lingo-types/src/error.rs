#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown language code: {0}")]
    UnknownLanguageCode(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid sort order: {0}, expected ASC or DESC")]
    InvalidSortOrder(String),
}
