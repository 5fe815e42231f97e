//! Pagination envelope for list responses.
//!
//! [`PageMeta`] is derived purely from the [`PageRequest`] and the total item
//! count reported by storage, it never looks at the length of the page data.

use std::{fmt::Display, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const DEFAULT_TAKE: u32 = 10;
pub const MAX_TAKE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("ASC"),
            SortOrder::Desc => f.write_str("DESC"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// Caller's page request, 1-based `page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: NonZeroU32,
    take: NonZeroU32,
    order: SortOrder,
    q: Option<String>,
}

impl PageRequest {
    pub fn new(page: NonZeroU32, take: NonZeroU32) -> Self {
        Self {
            page,
            take,
            order: SortOrder::default(),
            q: None,
        }
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn page(&self) -> u32 {
        self.page.get()
    }

    pub fn take(&self) -> u32 {
        self.take.get()
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    /// Number of items to skip in storage.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.take.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub take: u32,
    pub item_count: u64,
    pub page_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageMeta {
    pub fn new(request: &PageRequest, item_count: u64) -> Self {
        let page = request.page();
        let take = request.take();
        let page_count = item_count.div_ceil(u64::from(take));
        PageMeta {
            page,
            take,
            item_count,
            page_count,
            has_previous_page: page > 1,
            has_next_page: u64::from(page) < page_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self { data, meta }
    }

    pub fn from_request(data: Vec<T>, request: &PageRequest, item_count: u64) -> Self {
        Self::new(data, PageMeta::new(request, item_count))
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn request(page: u32, take: u32) -> PageRequest {
        PageRequest::new(NonZeroU32::new(page).unwrap(), NonZeroU32::new(take).unwrap())
    }

    #[test]
    fn test_middle_page() {
        let meta = PageMeta::new(&request(2, 5), 12);
        assert_eq!(meta.page_count, 3);
        assert!(meta.has_previous_page);
        assert!(meta.has_next_page);
    }

    #[test]
    fn test_empty_listing() {
        let meta = PageMeta::new(&request(1, 10), 0);
        assert_eq!(meta.page_count, 0);
        assert!(!meta.has_previous_page);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_last_page() {
        let meta = PageMeta::new(&request(3, 5), 15);
        assert_eq!(meta.page_count, 3);
        assert!(meta.has_previous_page);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_page_past_end() {
        let meta = PageMeta::new(&request(4, 5), 12);
        assert_eq!(meta.page_count, 3);
        assert!(meta.has_previous_page);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_count_not_taken_from_data() {
        let page = Page::from_request(vec!["a", "b"], &request(1, 2), 40);
        assert_eq!(page.data, vec!["a", "b"]);
        assert_eq!(page.meta.item_count, 40);
        assert_eq!(page.meta.page_count, 20);
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = Page::from_request(vec![1, 2, 3], &request(1, 3), 7);
        let meta = page.meta;
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20, 30]);
        assert_eq!(mapped.meta, meta);
    }

    #[test]
    fn test_skip() {
        assert_eq!(request(1, 10).skip(), 0);
        assert_eq!(request(3, 7).skip(), 14);
    }

    #[test]
    fn test_serialized_shape() {
        let page = Page::from_request(vec![1], &request(2, 5), 12);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": [1],
                "meta": {
                    "page": 2,
                    "take": 5,
                    "itemCount": 12,
                    "pageCount": 3,
                    "hasPreviousPage": true,
                    "hasNextPage": true
                }
            })
        );
    }

    #[test]
    fn test_sort_order() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[quickcheck]
    fn prop_page_count_covers_items(page: u16, take: u8, item_count: u32) -> bool {
        let req = request(u32::from(page) + 1, u32::from(take) + 1);
        let item_count = u64::from(item_count);
        let meta = PageMeta::new(&req, item_count);
        let take = u64::from(req.take());
        let covers = meta.page_count * take >= item_count;
        let tight = meta.page_count == 0 || (meta.page_count - 1) * take < item_count;
        covers && tight && (meta.page_count == 0) == (item_count == 0)
    }

    #[quickcheck]
    fn prop_navigation_flags(page: u16, take: u8, item_count: u32) -> bool {
        let req = request(u32::from(page) + 1, u32::from(take) + 1);
        let meta = PageMeta::new(&req, u64::from(item_count));
        meta.has_previous_page == (req.page() > 1)
            && meta.has_next_page == (u64::from(req.page()) < meta.page_count)
    }

    #[quickcheck]
    fn prop_idempotent(page: u16, take: u8, item_count: u32) -> bool {
        let req = request(u32::from(page) + 1, u32::from(take) + 1);
        PageMeta::new(&req, u64::from(item_count)) == PageMeta::new(&req, u64::from(item_count))
    }
}
