use lingo_dal::{user::UserRepository, Pool};
use lingo_types::config::BackendConfig;

pub mod change_password;
pub mod create_user;
pub mod migrate;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens the database and brings its schema up to date.
pub(crate) async fn open_database(backend: &BackendConfig) -> anyhow::Result<Pool> {
    backend.ensure_data_dir()?;
    let pool = lingo_dal::new_pool(&backend.database_url()).await?;
    lingo_dal::migrate(&pool).await?;
    Ok(pool)
}

pub(crate) async fn create_user_repository(
    backend: &BackendConfig,
) -> anyhow::Result<UserRepository> {
    let pool = open_database(backend).await?;
    Ok(UserRepository::new(pool))
}
