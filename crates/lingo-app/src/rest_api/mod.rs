use lingo_types::claim::ApiClaim;

use crate::error::{ApiError, ApiResult};

pub mod paging;
pub mod post;

pub use paging::Paging;

/// Numeric user id of the token subject.
pub(crate) fn claim_user_id(claim: &ApiClaim) -> ApiResult<i64> {
    claim.user_id().ok_or_else(|| {
        tracing::warn!("Token subject {} is not a user id", claim.sub);
        ApiError::Unauthorized
    })
}
