use std::{
    collections::HashSet,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::{FromRequestParts, Request},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use axum_extra::TypedHeader;
use futures::future::BoxFuture;
use headers::{authorization::Bearer, Authorization, HeaderMapExt as _};
use http::request::Parts;
use lingo_types::claim::{ApiClaim, Authorization as _, Role};
use tower::{Layer, Service};
use tracing::debug;

use crate::{error::ApiError, state::AppState};

fn validate_bearer(state: &AppState, token: &str) -> Result<ApiClaim, ApiError> {
    state.tokens().validate::<ApiClaim>(token).map_err(|e| {
        debug!("Failed to validate token: {e}");
        ApiError::Unauthorized
    })
}

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claim) = parts.extensions.get::<ApiClaim>() {
            return Ok(claim.clone());
        }

        let header = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("No bearer token: {e}");
                ApiError::Unauthorized
            })?;
        validate_bearer(state, header.token())
    }
}

/// Rejects requests without a valid bearer token, otherwise stores
/// the [`ApiClaim`] in request extensions.
#[derive(Clone)]
pub struct TokenLayer {
    state: AppState,
}

impl TokenLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TokenLayer {
    type Service = TokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request> for TokenService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let claim = match req.headers().typed_get::<Authorization<Bearer>>() {
            Some(header) => validate_bearer(&self.state, header.token()),
            None => {
                debug!("Missing bearer token for {}", req.uri());
                Err(ApiError::Unauthorized)
            }
        };

        match claim {
            Ok(claim) => {
                req.extensions_mut().insert(claim);
                Box::pin(self.inner.call(req))
            }
            Err(e) => Box::pin(async move { Ok(e.into_response()) }),
        }
    }
}

/// Admits requests whose claim has at least one of the roles.
/// Must be applied inside [`TokenLayer`].
#[derive(Clone)]
pub struct RequiredRolesLayer {
    roles: Arc<HashSet<Role>>,
}

impl RequiredRolesLayer {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: Arc::new(roles.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for RequiredRolesLayer {
    type Service = RequiredRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequiredRolesService {
            inner,
            roles: self.roles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequiredRolesService<S> {
    inner: S,
    roles: Arc<HashSet<Role>>,
}

impl<S> Service<Request> for RequiredRolesService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let rejection = match req.extensions().get::<ApiClaim>() {
            Some(claim) if claim.has_any_role(self.roles.iter().copied()) => None,
            Some(claim) => {
                debug!("User {} lacks any of roles {:?}", claim.sub, self.roles);
                Some(ApiError::Forbidden)
            }
            None => Some(ApiError::Unauthorized),
        };

        match rejection {
            None => Box::pin(self.inner.call(req)),
            Some(e) => Box::pin(async move { Ok(e.into_response()) }),
        }
    }
}
