//! Balance and settlement API endpoints

use api_types::balance::{BalancesResponse, MemberBalanceView};
use api_types::settlement::{
    SettlementCreated, SettlementNew, SettlementPlanResponse, SettlementTransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use engine::MoneyCents;

use crate::{ServerError, map_currency, server::ServerState, user};

/// Handle requests for a group's net balances
pub async fn balances(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let sheet = state.engine.group_balances(&group_id, user.id).await?;

    let currency = map_currency(sheet.currency);
    let balances = sheet
        .positions
        .into_iter()
        .map(|position| MemberBalanceView {
            member_id: position.balance.member_id,
            display_name: position.display_name,
            net_balance: position.balance.amount.to_major(sheet.currency),
            currency,
        })
        .collect();

    Ok(Json(BalancesResponse { balances }))
}

/// Handle requests for a group's settlement plan
pub async fn plan(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<SettlementPlanResponse>, ServerError> {
    let plan = state.engine.settlement_plan(&group_id, user.id).await?;

    let currency = map_currency(plan.currency);
    let transfers = plan
        .transfers
        .into_iter()
        .map(|planned| SettlementTransferView {
            from_user_id: planned.transfer.from,
            from_user_name: planned.from_name,
            to_user_id: planned.transfer.to,
            to_user_name: planned.to_name,
            amount: planned.transfer.amount.to_major(plan.currency),
            currency,
        })
        .collect();

    Ok(Json(SettlementPlanResponse { transfers }))
}

/// Handle requests for recording a settlement
pub async fn settlement_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<SettlementNew>,
) -> Result<Json<SettlementCreated>, ServerError> {
    let group = state.engine.group(&group_id, user.id).await?;
    let amount = MoneyCents::from_major_trunc(payload.amount, group.currency)?;

    let id = state
        .engine
        .record_settlement(
            &group_id,
            payload.from_user_id,
            payload.to_user_id,
            amount.cents(),
            user.id,
            payload.occurred_at.with_timezone(&Utc),
        )
        .await?;

    Ok(Json(SettlementCreated { id }))
}
