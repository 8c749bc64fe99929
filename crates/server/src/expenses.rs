//! Expense API endpoints

use api_types::expense::{
    ExpenseCreated, ExpenseList, ExpenseNew, ExpenseView, ExpensesResponse, SplitView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{FixedOffset, Utc};
use engine::MoneyCents;

use crate::{ServerError, map_currency, server::ServerState, user};

/// Handle requests for recording a new expense
pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseCreated>, ServerError> {
    // The group currency decides how decimal amounts truncate to minor
    // units, so resolve the group first.
    let group = state.engine.group(&group_id, user.id).await?;
    let amount = MoneyCents::from_major_trunc(payload.amount, group.currency)?;

    let splits = payload
        .splits
        .map(|splits| {
            splits
                .into_iter()
                .map(|split| {
                    MoneyCents::from_major_trunc(split.amount, group.currency)
                        .map(|amount| (split.user_id, amount.cents()))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let id = state
        .engine
        .add_expense(
            &group_id,
            &payload.description,
            amount.cents(),
            payload.paid_by,
            splits,
            user.id,
            payload.occurred_at.with_timezone(&Utc),
        )
        .await?;

    Ok(Json(ExpenseCreated { id }))
}

/// Handle requests for listing a group's expenses
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Query(payload): Query<ExpenseList>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let expenses = state.engine.list_expenses(&group_id, user.id, limit).await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let expenses = expenses
        .into_iter()
        .map(|expense| ExpenseView {
            id: expense.id,
            description: expense.description,
            amount: expense.amount.to_major(expense.currency),
            currency: map_currency(expense.currency),
            paid_by: expense.paid_by,
            occurred_at: expense.occurred_at.with_timezone(&utc),
            splits: expense
                .splits
                .iter()
                .map(|split| SplitView {
                    user_id: split.member_id,
                    amount: split.amount.to_major(expense.currency),
                })
                .collect(),
        })
        .collect();

    Ok(Json(ExpensesResponse { expenses }))
}
