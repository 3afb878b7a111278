//! WebSocket frame layouts.
//!
//! Inbound: `{"action": "...", "payload": {...}}`.
//! Outbound: `{"type": "update", "payload": <group>}` or
//! `{"type": "error", "payload": {"code": .., "message": ..}}`.

use crate::domain::error::WsErrorPayload;
use gp_01_group_repository::RepositoryError;
use serde::{Deserialize, Serialize};
use shared_types::{GroupView, MemberId, Role};

/// Envelope of an inbound frame, before the action is recognised.
#[derive(Debug, Deserialize)]
struct Envelope {
    action: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatesPayload {
    pub member_id: MemberId,
    pub lat: f32,
    pub lng: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    pub member_id: MemberId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickPayload {
    pub member_id: MemberId,
}

/// A recognised client action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Get,
    SendCoordinates(CoordinatesPayload),
    UpdateRole(RolePayload),
    Kick(KickPayload),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::SendCoordinates(_) => "send_coordinates",
            Self::UpdateRole(_) => "update_role",
            Self::Kick(_) => "kick",
        }
    }
}

/// Why an inbound frame was not turned into an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not a valid action envelope: {0}")]
    Malformed(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid payload for {action}: {details}")]
    InvalidPayload {
        action: &'static str,
        details: String,
    },
}

fn payload<T: serde::de::DeserializeOwned>(
    action: &'static str,
    payload: Option<serde_json::Value>,
) -> Result<T, FrameError> {
    let value = payload.ok_or_else(|| FrameError::InvalidPayload {
        action,
        details: "missing payload".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| FrameError::InvalidPayload {
        action,
        details: e.to_string(),
    })
}

/// Parse an inbound text frame.
pub fn parse_action(text: &str) -> Result<Action, FrameError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

    match envelope.action.as_str() {
        "get" => Ok(Action::Get),
        "send_coordinates" => {
            payload("send_coordinates", envelope.payload).map(Action::SendCoordinates)
        }
        "update_role" => payload("update_role", envelope.payload).map(Action::UpdateRole),
        "kick" => payload("kick", envelope.payload).map(Action::Kick),
        _ => Err(FrameError::UnknownAction(envelope.action)),
    }
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum OutboundFrame {
    Update(GroupView),
    Error(WsErrorPayload),
}

impl From<&RepositoryError> for OutboundFrame {
    fn from(e: &RepositoryError) -> Self {
        Self::Error(WsErrorPayload::from(e))
    }
}
