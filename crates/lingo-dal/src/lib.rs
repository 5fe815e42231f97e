pub mod error;
pub mod post;
pub mod translation;
pub mod user;

use std::{fmt::Display, str::FromStr as _};

pub use error::Error;
use lingo_types::paging::{PageRequest, SortOrder};
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type ChosenRow = sqlx::sqlite::SqliteRow;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const MAX_LIMIT: usize = 10_000;

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &Pool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

#[derive(Debug, Clone)]
pub enum Order {
    Asc(String),
    Desc(String),
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc(s) => write!(f, "{}", s),
            Order::Desc(s) => write!(f, "{} DESC", s),
        }
    }
}

impl AsRef<str> for Order {
    fn as_ref(&self) -> &str {
        match self {
            Order::Asc(s) => s.as_str(),
            Order::Desc(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingParams {
    pub offset: i64,
    pub limit: i64,
    pub order: Option<Vec<Order>>,
    /// Free text searched by the repository in its text columns.
    pub filter: Option<String>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT as i64,
            order: None,
            filter: None,
        }
    }
}

impl ListingParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            order: None,
            filter: None,
        }
    }

    pub fn with_order(mut self, order: Vec<Order>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Newest or oldest first by creation time, `id` breaks ties.
    pub fn from_page_request(request: &PageRequest) -> Self {
        let offset = i64::try_from(request.skip()).unwrap_or(i64::MAX);
        let order = ["created_at", "id"]
            .into_iter()
            .map(|field| match request.order() {
                SortOrder::Asc => Order::Asc(field.to_string()),
                SortOrder::Desc => Order::Desc(field.to_string()),
            })
            .collect();
        let params = ListingParams::new(offset, request.take().into()).with_order(order);
        match request.q() {
            Some(q) if !q.trim().is_empty() => params.with_filter(q.trim()),
            _ => params,
        }
    }

    pub fn ordering(&self, valid_fields: &[&str]) -> Result<String> {
        let ordering = self
            .order
            .as_ref()
            .map(|o| {
                o.iter()
                    .map(|o| {
                        if valid_fields.contains(&o.as_ref()) {
                            Ok(o.to_string())
                        } else {
                            Err(Error::InvalidOrderByField(o.as_ref().to_string()))
                        }
                    })
                    .collect::<Result<Vec<String>>>()
                    .map(|o| o.join(", "))
            })
            .transpose()?
            .unwrap_or_default();
        Ok(ordering)
    }

    pub(crate) fn like_pattern(&self) -> Option<String> {
        self.filter.as_ref().map(|f| {
            let escaped = f
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

/// One slice of a listing together with the total count of matching rows.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub offset: i64,
    pub limit: i64,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Batch<T> {
    pub fn map<U, F>(self, f: F) -> Batch<U>
    where
        F: FnMut(T) -> U,
    {
        Batch {
            offset: self.offset,
            limit: self.limit,
            total: self.total,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn request(page: u32, take: u32) -> PageRequest {
        PageRequest::new(NonZeroU32::new(page).unwrap(), NonZeroU32::new(take).unwrap())
    }

    #[test]
    fn test_from_page_request() {
        let params =
            ListingParams::from_page_request(&request(3, 20).with_order(SortOrder::Desc).with_query(" cat "));
        assert_eq!(params.offset, 40);
        assert_eq!(params.limit, 20);
        assert_eq!(params.filter.as_deref(), Some("cat"));
        assert_eq!(
            params.ordering(&["id", "created_at"]).unwrap(),
            "created_at DESC, id DESC"
        );
    }

    #[test]
    fn test_blank_query_ignored() {
        let params = ListingParams::from_page_request(&request(1, 10).with_query("   "));
        assert!(params.filter.is_none());
        assert_eq!(params.ordering(&["id", "created_at"]).unwrap(), "created_at, id");
    }

    #[test]
    fn test_invalid_order_field() {
        let params = ListingParams::new(0, 10).with_order(vec![Order::Asc("password".into())]);
        let err = params.ordering(&["id"]).unwrap_err();
        assert!(matches!(err, Error::InvalidOrderByField(f) if f == "password"));
    }

    #[test]
    fn test_like_pattern() {
        let params = ListingParams::new(0, 10).with_filter("50%_off");
        assert_eq!(params.like_pattern().unwrap(), "%50\\%\\_off%");
    }
}
