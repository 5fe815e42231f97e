use lingo_dal::{
    user::{CreateUser, UserRepositoryImpl},
    Error, ListingParams,
};
use lingo_types::claim::Role;
use tracing_test::traced_test;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    lingo_dal::migrate(&conn).await.unwrap();
    conn
}

fn new_user(email: &str, role: Role) -> CreateUser {
    CreateUser {
        first_name: Some("Test".to_string()),
        last_name: Some(email.split('@').next().unwrap().to_string()),
        email: email.parse().unwrap(),
        password: "password123".to_string(),
        phone: None,
        role,
    }
}

#[tokio::test]
#[traced_test]
async fn test_create_user_with_settings() {
    let repo = UserRepositoryImpl::new(init_db().await);
    let user = repo.create(new_user("ivan@example.com", Role::User)).await.unwrap();
    assert_eq!(user.email, "ivan@example.com");
    assert_eq!(user.role, Role::User);

    let settings = repo.settings(user.id).await.unwrap();
    assert_eq!(settings.user_id, user.id);
    assert!(!settings.is_email_verified);
    assert!(!settings.is_phone_verified);

    let found = repo.find_by_email("IVAN@example.com").await.unwrap();
    assert_eq!(found, user);
}

#[tokio::test]
async fn test_duplicate_email() {
    let repo = UserRepositoryImpl::new(init_db().await);
    repo.create(new_user("ivan@example.com", Role::User)).await.unwrap();
    let err = repo
        .create(new_user("ivan@example.com", Role::Admin))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[tokio::test]
#[traced_test]
async fn test_check_password() {
    let repo = UserRepositoryImpl::new(init_db().await);
    let user = repo.create(new_user("admin@example.com", Role::Admin)).await.unwrap();

    let checked = repo.check_password("admin@example.com", "password123").await.unwrap();
    assert_eq!(checked.id, user.id);
    assert_eq!(checked.role, Role::Admin);

    let err = repo.check_password("admin@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
    let err = repo.check_password("nobody@example.com", "password123").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));

    repo.change_password("admin@example.com", "new password").await.unwrap();
    assert!(repo.check_password("admin@example.com", "password123").await.is_err());
    assert!(repo.check_password("admin@example.com", "new password").await.is_ok());
    assert!(repo.change_password("nobody@example.com", "x").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_list_users() {
    let repo = UserRepositoryImpl::new(init_db().await);
    for name in ["anna", "boris", "vera", "gleb"] {
        repo.create(new_user(&format!("{name}@example.com"), Role::User)).await.unwrap();
    }

    let batch = repo.list(ListingParams::new(0, 3)).await.unwrap();
    assert_eq!(batch.total, 4);
    assert_eq!(batch.rows.len(), 3);
    // newest first by default
    assert_eq!(batch.rows[0].email, "gleb@example.com");

    let batch = repo.list(ListingParams::new(0, 10).with_filter("bor")).await.unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.rows[0].email, "boris@example.com");

    let batch = repo.list(ListingParams::new(2, 10)).await.unwrap();
    assert_eq!(batch.total, 4);
    assert_eq!(batch.rows.len(), 2);
}

#[tokio::test]
async fn test_get_missing_user() {
    let repo = UserRepositoryImpl::new(init_db().await);
    assert!(repo.get(1).await.unwrap_err().is_not_found());
    assert!(repo.settings(1).await.unwrap_err().is_not_found());
}
