use crate::error::Result;
use crate::policy::Role;
use async_trait::async_trait;
use progression_types::{AcademyId, ActorId, PlayerId};

/// Membership records owned by the external membership subsystem.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// The actor's functional role in the academy, `None` without membership.
    async fn role_of(&self, actor: &ActorId, academy: &AcademyId) -> Result<Option<Role>>;

    async fn is_member(&self, player: &PlayerId, academy: &AcademyId) -> Result<bool>;
}
