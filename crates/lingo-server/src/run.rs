use std::path::Path;

use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use lingo_app::{
    auth::{auth_router, token::TokenLayer},
    state::AppState,
};
use tokio::{fs, io::AsyncWriteExt as _};
use tower_http::trace::TraceLayer;
use tracing::info;

const SECRET_LENGTH: usize = 32;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if args.cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

pub fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/users", lingo_app::user::router())
        .nest("/api/post", lingo_app::rest_api::post::router())
        // All above routes are protected
        .layer(TokenLayer::new(state.clone()))
        .nest("/auth", auth_router())
        .with_state(state)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.backend.ensure_data_dir()?;

    let pool = lingo_dal::new_pool(&config.database_url()).await?;
    lingo_dal::migrate(&pool).await?;

    let secret = read_secret(&data_dir).await?;
    anyhow::ensure!(
        secret.len() == SECRET_LENGTH,
        "Secret file has invalid length {}",
        secret.len()
    );
    let tokens = lingo_auth::token::TokenManager::new(&secret, config.token_validity);
    Ok(AppState::new(config.into(), pool, tokens))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; SECRET_LENGTH]>();
        // written aside and renamed, so `secret` is never partial
        let tmp_file = data_dir.join("secret.tmp");
        #[cfg(unix)]
        let file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            // readable by owner only
            OpenOptions::new()
                .mode(0o600)
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_file)?
        };
        #[cfg(not(unix))]
        let file = std::fs::File::create(&tmp_file)?;

        let mut file = fs::File::from_std(file);
        file.write_all(&random_bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_file, &secret_file).await?;
        info!("Generated new token secret");
        random_bytes.to_vec()
    };
    Ok(secret)
}
