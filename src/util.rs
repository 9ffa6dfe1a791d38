//! Request header helpers shared by both surfaces.

use axum::http::HeaderMap;

/// Client source address for the activation log.
///
/// Proxy headers win: `x-forwarded-for` (first hop) then `x-real-ip`. A
/// direct connection without either yields None; the log column is nullable.
pub fn extract_source_addr(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))?
        .to_str()
        .ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

/// Bearer token from the Authorization header, or None when the header is
/// missing or not Bearer-shaped.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("Authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
