//! Caller identity extraction.
//!
//! Authentication itself happens upstream; the proxy strips any incoming
//! `x-user-*` headers and re-injects verified ones. This extractor only
//! parses them into an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use service::policy::Actor;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The verified caller, extracted from proxy-injected headers.
pub struct AuthUser(pub Actor);

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .parse::<Uuid>()
        .ok()?;
    let role = headers
        .get(USER_ROLE_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let name = headers
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Some(Actor::new(id, role, name))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map(AuthUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
