use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use garde::Validate;
use http::StatusCode;
use lingo_dal::user::{
    CreateUser, User, UserRepository, UserSettings, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH,
};
use lingo_types::{
    claim::{ApiClaim, Role},
    general::ValidEmail,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::ApiResult, state::AppState};

pub mod token;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
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
}

impl From<RegisterUser> for CreateUser {
    fn from(value: RegisterUser) -> Self {
        CreateUser {
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            password: value.password,
            phone: value.phone,
            role: Role::User,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub expires_in: u64,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: TokenPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Me {
    #[serde(flatten)]
    pub user: User,
    pub settings: UserSettings,
}

pub async fn register(
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<RegisterUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(payload.into()).await?;
    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    user_registry: UserRepository,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry
        .check_password(&credentials.email, &credentials.password)
        .await?;
    debug!("User {} logged in", user.id);

    let claim = ApiClaim::new_expired(user.id.to_string(), [user.role]);
    let access_token = state.tokens().issue(claim)?;
    let token = TokenPayload {
        expires_in: state.tokens().default_validity().as_secs(),
        access_token,
    };
    Ok((StatusCode::OK, Json(LoginResponse { user, token })))
}

pub async fn me(claim: ApiClaim, user_registry: UserRepository) -> ApiResult<impl IntoResponse> {
    let user_id = crate::rest_api::claim_user_id(&claim)?;
    let user = user_registry.get(user_id).await?;
    let settings = user_registry.settings(user_id).await?;
    Ok((StatusCode::OK, Json(Me { user, settings })))
}

/// Builds authentication router - must be nested on /auth path!
pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}
