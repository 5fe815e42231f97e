pub mod claim;
pub mod config;
pub mod error;
pub mod general;
pub mod language;
pub mod paging;

pub use error::ValidationError;
