//! Group and membership API endpoints

use api_types::group::{GroupNew, GroupView, GroupsResponse};
use api_types::membership::{MemberRole, MemberUpsert, MemberView, MembersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, engine_currency, map_currency, server::ServerState, user};

/// Handle requests for creating a new group
pub async fn group_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<Json<GroupView>, ServerError> {
    let currency = payload.currency;
    let group_id = state
        .engine
        .new_group(&payload.name, engine_currency(currency), user.id)
        .await?;

    Ok(Json(GroupView {
        id: group_id,
        name: payload.name,
        currency,
    }))
}

/// Handle requests for listing the user's groups
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GroupsResponse>, ServerError> {
    let groups = state
        .engine
        .list_groups(user.id)
        .await?
        .into_iter()
        .map(|group| GroupView {
            id: group.id,
            name: group.name,
            currency: map_currency(group.currency),
        })
        .collect();

    Ok(Json(GroupsResponse { groups }))
}

/// Handle requests for a single group
pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(&group_id, user.id).await?;

    Ok(Json(GroupView {
        id: group.id,
        name: group.name,
        currency: map_currency(group.currency),
    }))
}

pub async fn list_members(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_group_members(&group_id, user.id)
        .await?
        .into_iter()
        .map(|(member, role)| MemberView {
            user_id: member.id,
            username: member.username,
            display_name: member.display_name,
            role: match role {
                engine::MemberRole::Owner => MemberRole::Owner,
                engine::MemberRole::Member => MemberRole::Member,
            },
        })
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn upsert_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<MemberUpsert>,
) -> Result<StatusCode, ServerError> {
    let role = match payload.role {
        MemberRole::Owner => engine::MemberRole::Owner,
        MemberRole::Member => engine::MemberRole::Member,
    };
    state
        .engine
        .upsert_group_member(&group_id, payload.user_id, role.as_str(), user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((group_id, member_user_id)): Path<(String, i64)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_group_member(&group_id, member_user_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
