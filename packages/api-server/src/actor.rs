//! Caller identity extraction
//!
//! The upstream session layer forwards the authenticated actor in two
//! headers. [`actor_middleware`] turns them into an [`AuthContext`] request
//! extension that handlers read with `Extension<AuthContext>`. Requests
//! without the headers are treated as guests.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use classifieds_core::auth::{AuthContext, Role};

use crate::http_error::HttpError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, HttpError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            HttpError::new(format!("Header {} is not valid text", name), "VALIDATION_ERROR")
        }),
    }
}

/// Build the caller's [`AuthContext`] from the identity headers
pub fn actor_from_headers(headers: &HeaderMap) -> Result<AuthContext, HttpError> {
    let actor_id = match header(headers, ACTOR_ID_HEADER)? {
        None => None,
        Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
            HttpError::new(format!("Invalid actor id '{}'", raw), "VALIDATION_ERROR")
        })?),
    };

    let role = match header(headers, ACTOR_ROLE_HEADER)? {
        None => Role::Guest,
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            HttpError::new(format!("Unknown actor role '{}'", raw), "VALIDATION_ERROR")
        })?,
    };

    Ok(AuthContext::new(actor_id, role))
}

/// Attach the caller's [`AuthContext`] to the request, rejecting bad headers with 400
pub async fn actor_middleware(mut request: Request, next: Next) -> Result<Response, HttpError> {
    let actor = actor_from_headers(request.headers())?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
