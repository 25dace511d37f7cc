use crate::ids::ActorId;
use serde::{Deserialize, Serialize};

/// Caller identity as produced by the authentication layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: ActorId,
    /// Platform administrators bypass academy membership checks.
    #[serde(default)]
    pub platform_admin: bool,
}

impl ActorContext {
    pub fn user(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: ActorId::new(actor_id),
            platform_admin: false,
        }
    }

    pub fn platform_admin(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: ActorId::new(actor_id),
            platform_admin: true,
        }
    }
}
