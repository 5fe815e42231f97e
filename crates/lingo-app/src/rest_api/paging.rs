use std::num::NonZeroU32;

use garde::Validate;
use lingo_types::paging::{PageRequest, SortOrder, MAX_TAKE};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Listing query string, `?page=2&take=20&order=DESC&q=rust`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = MAX_TAKE))]
    take: Option<u32>,
    #[garde(length(max = 16))]
    order: Option<String>,
    #[garde(length(max = 255))]
    q: Option<String>,
}

impl Paging {
    /// `default_take` is used when the query has no `take`, capped at [`MAX_TAKE`].
    pub fn into_page_request(self, default_take: NonZeroU32) -> ApiResult<PageRequest> {
        let page = self.page.and_then(NonZeroU32::new).unwrap_or(NonZeroU32::MIN);
        let take = self
            .take
            .unwrap_or(default_take.get())
            .min(MAX_TAKE);
        let take = NonZeroU32::new(take).unwrap_or(default_take);
        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(order) => order
                .parse::<SortOrder>()
                .map_err(|e| ApiError::InvalidQuery(e.to_string()))?,
        };
        let request = PageRequest::new(page, take).with_order(order);
        Ok(match self.q {
            Some(q) => request.with_query(q),
            None => request,
        })
    }
}
