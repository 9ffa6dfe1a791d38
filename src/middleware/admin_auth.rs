use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::util::extract_bearer_token;

/// Identity of the authenticated operator, inserted as a request extension.
#[derive(Clone)]
pub struct AdminContext {
    /// Truncated token, safe to record in logs
    pub operator: String,
}

/// Single authorization gate for the whole admin router.
///
/// The caller must present a bearer token from the static operator
/// allow-list. Every failure is the same bare 401; no route, key, or
/// token-validity detail leaks to unauthorized callers.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    if !state.admin_tokens.iter().any(|t| t == token) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let operator = token.chars().take(8).collect::<String>();
    request.extensions_mut().insert(AdminContext { operator });
    Ok(next.run(request).await)
}
