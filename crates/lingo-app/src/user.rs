use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing,
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use lingo_dal::{
    post::{PostDto, PostRepository},
    user::UserRepository,
    ListingParams,
};
use lingo_types::{claim::Role, paging::Page};

use crate::{
    auth::token::RequiredRolesLayer, error::ApiResult, language::RequestLanguage,
    repository_from_request, rest_api::Paging, state::AppState,
};

repository_from_request!(UserRepository);

pub async fn list(
    State(state): State<AppState>,
    repository: UserRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let request = paging.into_page_request(state.config().default_page_size)?;
    let batch = repository
        .list(ListingParams::from_page_request(&request))
        .await?;
    let page = Page::from_request(batch.rows, &request, batch.total);
    Ok((StatusCode::OK, Json(page)))
}

pub async fn get(Path(id): Path<i64>, repository: UserRepository) -> ApiResult<impl IntoResponse> {
    let user = repository.get(id).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn list_posts(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    users: UserRepository,
    posts: PostRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    // 404 for unknown user rather than an empty page
    users.get(id).await?;
    let request = paging.into_page_request(state.config().default_page_size)?;
    let batch = posts
        .list_by_user(id, ListingParams::from_page_request(&request))
        .await?;
    let page = Page::from_request(batch.rows, &request, batch.total)
        .map(|post| PostDto::project(&post, language));
    Ok((StatusCode::OK, Json(page)))
}

/// Users resource, nest on `/users` behind the token layer.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", routing::get(list))
        .route("/{id}", routing::get(get))
        .layer(RequiredRolesLayer::new([Role::Admin]))
        .route("/{id}/posts", routing::get(list_posts))
}
