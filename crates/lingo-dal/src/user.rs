use argon2::{
    password_hash::{rand_core::OsRng, Result as HashResult, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use garde::Validate;
use lingo_types::{claim::Role, general::ValidEmail};
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, Row};
use time::PrimitiveDateTime;
use tracing::debug;

use crate::{
    error::{Error, Result},
    Batch, ChosenDB, ChosenRow, ListingParams,
};

const VALID_ORDER_FIELDS: &[&str] = &["id", "created_at", "updated_at", "email"];
const DEFAULT_ORDER: &str = "created_at DESC, id DESC";
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 255;
const USER_COLUMNS: &str =
    "id, first_name, last_name, role, email, phone, avatar, created_at, updated_at";

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[garde(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[garde(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = PASSWORD_MIN_LENGTH, max = PASSWORD_MAX_LENGTH))]
    pub password: String,
    #[garde(length(min = 3, max = 32))]
    pub phone: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub role: Role,
}

/// New password for an existing account.
#[derive(Debug, Clone, Validate)]
pub struct PasswordChange {
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = PASSWORD_MIN_LENGTH, max = PASSWORD_MAX_LENGTH))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

impl sqlx::FromRow<'_, ChosenRow> for User {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: Box::new(e),
        })?;
        Ok(User {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            avatar: row.try_get("avatar")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub user_id: i64,
}

pub type UserRepository = UserRepositoryImpl<Pool<ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates the user together with default settings.
    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let password = hash_password(&payload.password)?;
        let mut tx = self.executor.begin().await?;

        let id = sqlx::query(
            "INSERT INTO users (first_name, last_name, role, email, password, phone) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.role.as_str())
        .bind(payload.email.as_ref())
        .bind(&password)
        .bind(&payload.phone)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("INSERT INTO user_settings (user_id) VALUES (?)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Created user {id} with role {}", payload.role);
        self.get(id).await
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<User>> {
        let order = match params.ordering(VALID_ORDER_FIELDS)? {
            o if o.is_empty() => DEFAULT_ORDER.to_string(),
            o => o,
        };
        let pattern = params.like_pattern();
        let where_clause = if pattern.is_some() {
            "WHERE email LIKE ?1 ESCAPE '\\' OR first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\'"
        } else {
            ""
        };

        let count_sql = format!("SELECT count(*) FROM users {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern.as_str());
        }
        let total = count_query.fetch_one(&self.executor).await?;

        // numbered placeholders, limit and offset follow the filter
        let (limit_ph, offset_ph) = if pattern.is_some() { ("?2", "?3") } else { ("?1", "?2") };
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {where_clause} ORDER BY {order} LIMIT {limit_ph} OFFSET {offset_ph}"
        );
        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(pattern) = &pattern {
            query = query.bind(pattern.as_str());
        }
        let rows = query
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.executor)
            .await?;

        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total: total.try_into().unwrap_or_default(),
            rows,
        })
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn settings(&self, user_id: i64) -> Result<UserSettings> {
        sqlx::query_as::<_, UserSettings>(
            "SELECT is_email_verified, is_phone_verified, user_id FROM user_settings WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::RecordNotFound("UserSettings".to_string()))
    }

    pub async fn check_password(&self, email: &str, password: &str) -> Result<User> {
        let (id, hashed_password): (i64, String) =
            sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
                .bind(email.trim().to_lowercase())
                .fetch_one(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if verify_password(password, &hashed_password).unwrap_or(false) {
            return self.get(id).await;
        }
        Err(Error::InvalidCredentials)
    }

    pub async fn change_password(&self, email: &str, password: &str) -> Result<()> {
        let password = hash_password(password)?;
        let res = sqlx::query(
            "UPDATE users SET password = ?, updated_at = datetime('now') WHERE email = ?",
        )
        .bind(&password)
        .bind(email.trim().to_lowercase())
        .execute(&self.executor)
        .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("User".to_string()))
        } else {
            Ok(())
        }
    }
}
