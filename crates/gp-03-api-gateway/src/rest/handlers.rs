//! REST handlers.
//!
//! Handlers are thin: extract, call the repository, export the result.
//! Status codes come from [`ApiError`](crate::domain::error::ApiError).

use crate::domain::error::ApiResult;
use crate::middleware::Caller;
use crate::rest::AppState;
use crate::ws::WebSocketHandler;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use gp_01_group_repository::{Membership, RepositoryError};
use serde::{Deserialize, Serialize};
use shared_types::{CoordsBit, GroupView, MemberDraft, MemberId, Role};
use tracing::info;

/// Body of create and join requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub name: String,
    #[serde(alias = "androidId")]
    pub device_id: String,
    pub lat: f32,
    pub lng: f32,
}

impl MemberRequest {
    fn into_draft(self) -> MemberDraft {
        MemberDraft::new(self.name, self.device_id, CoordsBit::now(self.lat, self.lng))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub your_id: MemberId,
    pub group: GroupView,
    pub token: String,
}

/// Join response. `yourId` and `token` are omitted on rejoin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub group: GroupView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub your_id: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CoordsForm {
    pub lat: f32,
    pub lng: f32,
}

/// POST /group
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<MemberRequest>,
) -> ApiResult<Response> {
    let group = state.repository.create_group(request.into_draft())?;
    let founder = group
        .founder()
        .ok_or_else(|| RepositoryError::storage("created group has no members"))?;
    let token = state
        .tokens
        .create_token(&founder.secret, &founder.device_id)?;

    let response = CreatedResponse {
        your_id: founder.id.clone(),
        group: group.export(),
        token,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// POST /group/:id
pub async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<MemberRequest>,
) -> ApiResult<Response> {
    let outcome = state
        .repository
        .add_member_to_group(&group_id, request.into_draft())?;

    let response = match &outcome.membership {
        Membership::Created(member) => JoinResponse {
            group: outcome.group.export(),
            your_id: Some(member.id.clone()),
            token: Some(
                state
                    .tokens
                    .create_token(&member.secret, &member.device_id)?,
            ),
        },
        Membership::Rejoined(_) => JoinResponse {
            group: outcome.group.export(),
            your_id: None,
            token: None,
        },
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /group/:id
pub async fn get_group(
    State(state): State<AppState>,
    Caller(pile): Caller,
    Path(group_id): Path<String>,
) -> ApiResult<Json<GroupView>> {
    let view = state.repository.get_group_by_id(&group_id, &pile)?;
    Ok(Json(view))
}

/// PATCH /member/:id/role
pub async fn update_role(
    State(state): State<AppState>,
    Caller(pile): Caller,
    Path(member_id): Path<String>,
    Form(form): Form<RoleForm>,
) -> ApiResult<Json<GroupView>> {
    let group = state
        .repository
        .update_member_role(&member_id, form.role, &pile)?;
    Ok(Json(group.export()))
}

/// PATCH /member/:id/coords-bit
pub async fn update_coords_bit(
    State(state): State<AppState>,
    Caller(pile): Caller,
    Path(member_id): Path<String>,
    Form(form): Form<CoordsForm>,
) -> ApiResult<Json<GroupView>> {
    let group = state.repository.update_member_coords_bit(
        &member_id,
        CoordsBit::now(form.lat, form.lng),
        &pile,
    )?;
    Ok(Json(group.export()))
}

/// DELETE /member/:id
///
/// Open sockets of the removed member are closed.
pub async fn kick_member(
    State(state): State<AppState>,
    Caller(pile): Caller,
    Path(member_id): Path<String>,
) -> ApiResult<Json<GroupView>> {
    let group = state.repository.kick_member(&member_id, &pile)?;
    state.hub.evict_non_members(&group).await;
    Ok(Json(group.export()))
}

/// GET /group/:id/ws
///
/// Membership is checked before the upgrade; a caller that may not read the
/// group never gets a socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Caller(pile): Caller,
    Path(group_id): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> ApiResult<Response> {
    state.repository.get_group_by_id(&group_id, &pile)?;

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    info!(group_id = %group_id, "Upgrading to WebSocket");
    let handler = WebSocketHandler::new(state.hub.clone(), state.websocket.clone());
    Ok(upgrade
        .max_message_size(state.websocket.transport_limit)
        .max_frame_size(state.websocket.transport_limit)
        .write_buffer_size(state.websocket.send_buffer)
        .on_upgrade(move |socket| handler.handle(socket, group_id, pile)))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}
