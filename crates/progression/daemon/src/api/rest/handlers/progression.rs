//! Player progression handlers

use crate::api::rest::actor::Actor;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use progression_service::{
    ApproveUpgradeRequest, EvaluationReport, GrantBadgeRequest, LedgerSummary,
};
use progression_types::{AcademyId, PlayerId, ProgressionProfile};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// `/academies/:academy/players/:player` path segments
#[derive(Debug, Deserialize)]
pub struct PlayerPath {
    pub academy: String,
    pub player: String,
}

impl PlayerPath {
    fn ids(&self) -> (AcademyId, PlayerId) {
        (
            AcademyId::new(self.academy.clone()),
            PlayerId::new(self.player.clone()),
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetIdentityKeyRequest {
    pub identity_key: String,
}

/// Get (or create) a player's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
) -> ApiResult<Json<ProgressionProfile>> {
    let (academy, player) = path.ids();
    Ok(Json(state.service.profile(&actor, &academy, &player).await?))
}

/// Ledger totals for a player
pub async fn get_ledger(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
) -> ApiResult<Json<LedgerSummary>> {
    let (academy, player) = path.ids();
    Ok(Json(
        state
            .service
            .ledger_summary(&actor, &academy, &player)
            .await?,
    ))
}

/// Pull the latest assessment into the profile
pub async fn sync_assessment(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
) -> ApiResult<Json<ProgressionProfile>> {
    let (academy, player) = path.ids();
    Ok(Json(
        state
            .service
            .sync_after_assessment(&actor, &academy, &player)
            .await?,
    ))
}

/// Current eligibility for the next stage
pub async fn get_evaluation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
) -> ApiResult<Json<EvaluationReport>> {
    let (academy, player) = path.ids();
    Ok(Json(state.service.evaluate(&actor, &academy, &player).await?))
}

/// Approve promotion to the next stage. An empty body means no notes and no
/// expected stage; anything else must be a valid request.
pub async fn approve_upgrade(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
    body: Bytes,
) -> ApiResult<Json<ProgressionProfile>> {
    let (academy, player) = path.ids();
    let request = parse_optional_body::<ApproveUpgradeRequest>(&body)?;
    Ok(Json(
        state
            .service
            .approve_upgrade(&actor, &academy, &player, request)
            .await?,
    ))
}

fn parse_optional_body<T>(body: &[u8]) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("invalid request body: {e}")))
}

/// Grant a badge
pub async fn grant_badge(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
    Json(request): Json<GrantBadgeRequest>,
) -> ApiResult<Json<ProgressionProfile>> {
    let (academy, player) = path.ids();
    Ok(Json(
        state
            .service
            .grant_badge(&actor, &academy, &player, request)
            .await?,
    ))
}

/// Link the profile to an external identity
pub async fn set_identity_key(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(path): Path<PlayerPath>,
    Json(request): Json<SetIdentityKeyRequest>,
) -> ApiResult<Json<ProgressionProfile>> {
    let (academy, player) = path.ids();
    Ok(Json(
        state
            .service
            .set_identity_key(&actor, &academy, &player, request.identity_key)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_a_default_request() {
        let request: ApproveUpgradeRequest = parse_optional_body(b"").unwrap();
        assert!(request.expected_stage.is_none());
        let request: ApproveUpgradeRequest = parse_optional_body(b" \n").unwrap();
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let result: ApiResult<ApproveUpgradeRequest> =
            parse_optional_body(br#"{"expected_stage":"Gold","notes":7}"#);
        assert!(matches!(result, Err(ApiError::Validation(_))));
        let result: ApiResult<ApproveUpgradeRequest> = parse_optional_body(b"{not json");
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
