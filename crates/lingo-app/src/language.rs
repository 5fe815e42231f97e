use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap};
use lingo_types::language::LanguageCode;

pub const LANGUAGE_CODE_HEADER: &str = "x-language-code";

/// Language the caller wants translated content in, if any supported one.
///
/// Explicit `x-language-code` header wins over `Accept-Language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestLanguage(pub Option<LanguageCode>);

impl RequestLanguage {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let explicit = headers
            .get(LANGUAGE_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.trim()
                    .parse::<LanguageCode>()
                    .ok()
                    .or_else(|| LanguageCode::from_language_tag(v))
            });
        let language = explicit.or_else(|| {
            headers
                .get_all(ACCEPT_LANGUAGE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(LanguageCode::from_accept_language)
        });
        RequestLanguage(language)
    }
}

impl<S> FromRequestParts<S> for RequestLanguage
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestLanguage::from_headers(&parts.headers))
    }
}
