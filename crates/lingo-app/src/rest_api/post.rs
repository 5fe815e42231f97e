use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing,
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use lingo_dal::{
    post::{CreatePost, PostDto, PostRepository, UpdatePost},
    ListingParams,
};
use lingo_types::{claim::ApiClaim, paging::Page};
use tracing::debug;

use super::{claim_user_id, Paging};
use crate::{
    error::{ApiError, ApiResult},
    language::RequestLanguage,
    repository_from_request,
    state::AppState,
};

repository_from_request!(PostRepository);

pub async fn create(
    claim: ApiClaim,
    RequestLanguage(language): RequestLanguage,
    repository: PostRepository,
    Garde(Json(payload)): Garde<Json<CreatePost>>,
) -> ApiResult<impl IntoResponse> {
    let user_id = claim_user_id(&claim)?;
    let post = repository.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(PostDto::project(&post, language))))
}

pub async fn list(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    repository: PostRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let request = paging.into_page_request(state.config().default_page_size)?;
    let batch = repository
        .list(ListingParams::from_page_request(&request))
        .await?;
    let page = Page::from_request(batch.rows, &request, batch.total)
        .map(|post| PostDto::project(&post, language));
    Ok((StatusCode::OK, Json(page)))
}

pub async fn get(
    Path(id): Path<i64>,
    RequestLanguage(language): RequestLanguage,
    repository: PostRepository,
) -> ApiResult<impl IntoResponse> {
    let post = repository.get(id).await?;
    Ok((StatusCode::OK, Json(PostDto::project(&post, language))))
}

pub async fn update(
    Path(id): Path<i64>,
    claim: ApiClaim,
    RequestLanguage(language): RequestLanguage,
    repository: PostRepository,
    Garde(Json(payload)): Garde<Json<UpdatePost>>,
) -> ApiResult<impl IntoResponse> {
    let post = repository.get(id).await?;
    if !claim.may_modify(post.user_id) {
        debug!("User {} cannot update post {id}", claim.sub);
        return Err(ApiError::Forbidden);
    }
    let post = repository.update(id, payload).await?;
    Ok((StatusCode::OK, Json(PostDto::project(&post, language))))
}

pub async fn delete(
    Path(id): Path<i64>,
    claim: ApiClaim,
    repository: PostRepository,
) -> ApiResult<impl IntoResponse> {
    let post = repository.get(id).await?;
    if !claim.may_modify(post.user_id) {
        debug!("User {} cannot delete post {id}", claim.sub);
        return Err(ApiError::Forbidden);
    }
    repository.delete(id).await?;
    Ok((StatusCode::ACCEPTED, ()))
}

/// Post resource, nest on `/api/post` behind the token layer.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", routing::get(list).post(create))
        .route("/{id}", routing::get(get).put(update).delete(delete))
}
