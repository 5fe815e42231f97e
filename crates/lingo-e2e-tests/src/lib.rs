use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use lingo_app::auth::LoginResponse;
use lingo_dal::user::{CreateUser, UserRepository};
use lingo_server::config::{Parser, ServerConfig};
use lingo_types::claim::Role;
use rand::Rng as _;
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::json;
use tempfile::TempDir;
use tracing::{debug, info};

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) | Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "lingo-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--token-validity",
        "1h",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub fn base_url(config: &ServerConfig) -> Url {
    // port is always valid
    Url::parse(&format!("http://127.0.0.1:{}/", config.port)).unwrap()
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .unwrap()
        .pop_if_empty()
        .push(&segment.to_string());
    url
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestUser {
    Admin,
    User,
    OtherUser,
}

impl TestUser {
    pub const ALL: [TestUser; 3] = [TestUser::Admin, TestUser::User, TestUser::OtherUser];

    pub fn email(&self) -> &'static str {
        match self {
            TestUser::Admin => "admin@example.com",
            TestUser::User => "user@example.com",
            TestUser::OtherUser => "other@example.com",
        }
    }

    pub fn password(&self) -> &'static str {
        match self {
            TestUser::Admin => "admin-password",
            TestUser::User => "user-password",
            TestUser::OtherUser => "other-password",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            TestUser::Admin => Role::Admin,
            TestUser::User | TestUser::OtherUser => Role::User,
        }
    }
}

/// Creates config in fresh temporary data directory and seeds database with [`TestUser`]s.
pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    let (config, guard) = test_config(test_name, &base_dir)?;

    let pool = lingo_dal::new_pool(&config.database_url()).await?;
    lingo_dal::migrate(&pool).await?;
    let users = UserRepository::new(pool.clone());
    for user in TestUser::ALL {
        users
            .create(CreateUser {
                first_name: Some(format!("{user:?}")),
                last_name: None,
                email: user.email().parse()?,
                password: user.password().to_string(),
                phone: None,
                role: user.role(),
            })
            .await?;
    }
    pool.close().await;
    Ok((config, guard))
}

/// Runs server in background task and waits until it answers health check.
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let health_url = base_url(&args).join("health")?;
    tokio::spawn(async move {
        if let Err(e) = lingo_server::run(args).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    Err(anyhow!("Server did not start"))
}

pub async fn login(base_url: &Url, user: TestUser) -> Result<LoginResponse> {
    let response = reqwest::Client::new()
        .post(base_url.join("auth/login")?)
        .json(&json!({"email": user.email(), "password": user.password()}))
        .send()
        .await?;
    debug!("Login response: {:#?}", response);
    anyhow::ensure!(response.status().is_success(), "Login failed: {}", response.status());
    Ok(response.json().await?)
}

pub fn authorized_client(token: &str) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

/// Starts server and returns client authorized as given user.
pub async fn launch_env(
    args: ServerConfig,
    user: TestUser,
) -> Result<(reqwest::Client, LoginResponse)> {
    let base_url = base_url(&args);
    spawn_server(args).await?;
    let login = login(&base_url, user).await?;
    info!("Logged in as user {}", login.user.id);
    let client = authorized_client(&login.token.access_token)?;
    Ok((client, login))
}
