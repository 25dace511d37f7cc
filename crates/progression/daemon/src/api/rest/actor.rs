//! Caller identity from upstream authentication headers

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use progression_types::ActorContext;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const PLATFORM_ROLE_HEADER: &str = "x-platform-role";

/// Platform role value that marks a platform administrator.
pub const PLATFORM_ADMIN_ROLE: &str = "admin";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ACTOR_ID_HEADER}")))?;

        let platform_admin = parts
            .headers
            .get(PLATFORM_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|role| role.trim().eq_ignore_ascii_case(PLATFORM_ADMIN_ROLE))
            .unwrap_or(false);

        let context = if platform_admin {
            ActorContext::platform_admin(actor_id)
        } else {
            ActorContext::user(actor_id)
        };
        Ok(Actor(context))
    }
}
