use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, MoneyCents, ResultEngine, SplitShare, expense_splits, expenses,
    split_even,
    util::{model_currency, parse_uuid},
};

use super::{Engine, normalize_required_text};

impl Engine {
    /// Records an expense paid by `paid_by` and split across participants.
    ///
    /// With `splits = None` the amount is split evenly across the whole
    /// roster. Explicit splits must reference group members only and sum
    /// exactly to the amount; the `Expense` constructor enforces the sum.
    pub async fn add_expense(
        &self,
        group_id: &str,
        description: &str,
        amount_minor: i64,
        paid_by: i64,
        splits: Option<Vec<(i64, i64)>>,
        user_id: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let group_id = group_id.to_string();
        let description = normalize_required_text(description, "expense description")?;
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let group = engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                let currency = model_currency(&group.currency)?;
                engine
                    .require_member_of_group(db_tx, group_id.as_str(), paid_by)
                    .await?;

                let amount = MoneyCents::new(amount_minor);
                let shares: Vec<SplitShare> = match splits {
                    Some(explicit) => {
                        for &(member_id, _) in &explicit {
                            engine
                                .require_member_of_group(db_tx, group_id.as_str(), member_id)
                                .await?;
                        }
                        explicit
                            .into_iter()
                            .map(|(member_id, cents)| SplitShare {
                                member_id,
                                amount: MoneyCents::new(cents),
                            })
                            .collect()
                    }
                    None => {
                        let roster = engine.group_roster(db_tx, group_id.as_str()).await?;
                        let member_ids: Vec<i64> =
                            roster.iter().map(|(user, _)| user.id).collect();
                        split_even(amount, &member_ids)?
                    }
                };

                let expense = Expense::new(
                    group_id.clone(),
                    description,
                    amount,
                    currency,
                    paid_by,
                    user_id,
                    occurred_at,
                    shares,
                )?;

                expenses::ActiveModel::from(&expense).insert(db_tx).await?;
                for split in &expense.splits {
                    expense_splits::ActiveModel::from((expense.id, split))
                        .insert(db_tx)
                        .await?;
                }

                Ok(expense.id)
            })
        })
        .await
    }

    /// Lists recent expenses of a group, newest first, splits included.
    pub async fn list_expenses(
        &self,
        group_id: &str,
        user_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<Expense>> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;

                let expense_models: Vec<expenses::Model> = expenses::Entity::find()
                    .filter(expenses::Column::GroupId.eq(group_id.clone()))
                    .order_by_desc(expenses::Column::OccurredAt)
                    .limit(limit)
                    .all(db_tx)
                    .await?;

                let ids: Vec<String> = expense_models.iter().map(|m| m.id.clone()).collect();
                let split_models: Vec<expense_splits::Model> = expense_splits::Entity::find()
                    .filter(expense_splits::Column::ExpenseId.is_in(ids))
                    .order_by_asc(expense_splits::Column::MemberId)
                    .all(db_tx)
                    .await?;

                let mut out = Vec::with_capacity(expense_models.len());
                for model in expense_models {
                    let splits: Vec<SplitShare> = split_models
                        .iter()
                        .filter(|s| s.expense_id == model.id)
                        .map(|s| SplitShare {
                            member_id: s.member_id,
                            amount: MoneyCents::new(s.amount_minor),
                        })
                        .collect();
                    if splits.is_empty() {
                        return Err(EngineError::BalanceIntegrity(format!(
                            "expense {} has no splits",
                            model.id
                        )));
                    }

                    out.push(Expense {
                        id: parse_uuid(&model.id, "expense")?,
                        group_id: model.group_id,
                        description: model.description,
                        amount: MoneyCents::new(model.amount_minor),
                        currency: model_currency(&model.currency)?,
                        paid_by: model.paid_by,
                        created_by: model.created_by,
                        occurred_at: model.occurred_at,
                        splits,
                    });
                }
                Ok(out)
            })
        })
        .await
    }
}
