use axum::http::{header, HeaderMap, HeaderValue};
use serde::Deserialize;

use petstore_core::{DomainError, DomainResult, ETag};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PetCreateRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PetUpdateRequest {
    pub name: String,
}

// -------------------------
// Headers
// -------------------------

/// Raw `If-Match` value, exactly as sent. A missing or non-visible-ASCII
/// header is treated as absent.
pub fn if_match(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
}

/// `ETag` header carrying the tag verbatim.
pub fn etag_header(etag: &ETag) -> DomainResult<[(header::HeaderName, HeaderValue); 1]> {
    let value = HeaderValue::from_str(etag.as_str())
        .map_err(|e| DomainError::internal(format!("entity tag is not a valid header value: {e}")))?;
    Ok([(header::ETAG, value)])
}
