use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, LedgerFact, MemberBalance, MoneyCents, ResultEngine, Settlement,
    Transfer, aggregate_balances, expense_splits, expenses, plan_settlement, settlements,
    util::model_currency,
};

use super::Engine;

/// A member's net position with the display name attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberPosition {
    pub balance: MemberBalance,
    pub display_name: String,
}

/// All member positions of one group, in roster order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSheet {
    pub currency: Currency,
    pub positions: Vec<MemberPosition>,
}

/// A planned transfer with display names attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub transfer: Transfer,
    pub from_name: String,
    pub to_name: String,
}

/// The proposed transfers that settle one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementPlan {
    pub currency: Currency,
    pub transfers: Vec<PlannedTransfer>,
}

impl Engine {
    /// Records a repayment between two group members.
    pub async fn record_settlement(
        &self,
        group_id: &str,
        from_member_id: i64,
        to_member_id: i64,
        amount_minor: i64,
        user_id: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let group = engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                let currency = model_currency(&group.currency)?;
                engine
                    .require_member_of_group(db_tx, group_id.as_str(), from_member_id)
                    .await?;
                engine
                    .require_member_of_group(db_tx, group_id.as_str(), to_member_id)
                    .await?;

                let settlement = Settlement::new(
                    group_id.clone(),
                    from_member_id,
                    to_member_id,
                    MoneyCents::new(amount_minor),
                    currency,
                    user_id,
                    occurred_at,
                )?;
                settlements::ActiveModel::from(&settlement)
                    .insert(db_tx)
                    .await?;

                Ok(settlement.id)
            })
        })
        .await
    }

    /// Returns each member's net balance in the group, names attached.
    pub async fn group_balances(&self, group_id: &str, user_id: i64) -> ResultEngine<BalanceSheet> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                engine.balance_sheet(db_tx, group_id.as_str()).await
            })
        })
        .await
    }

    /// Proposes the transfers that settle the whole group.
    ///
    /// The plan is computed fresh from the current ledger; recording one of
    /// its transfers as a settlement feeds back into the next aggregation
    /// as an offsetting entry.
    pub async fn settlement_plan(
        &self,
        group_id: &str,
        user_id: i64,
    ) -> ResultEngine<SettlementPlan> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                let sheet = engine.balance_sheet(db_tx, group_id.as_str()).await?;

                let balances: Vec<MemberBalance> =
                    sheet.positions.iter().map(|p| p.balance).collect();
                let names: HashMap<i64, &str> = sheet
                    .positions
                    .iter()
                    .map(|p| (p.balance.member_id, p.display_name.as_str()))
                    .collect();

                let transfers = plan_settlement(&balances)?
                    .into_iter()
                    .map(|transfer| {
                        let from_name = names.get(&transfer.from).ok_or_else(|| {
                            EngineError::KeyNotFound("user not exists".to_string())
                        })?;
                        let to_name = names.get(&transfer.to).ok_or_else(|| {
                            EngineError::KeyNotFound("user not exists".to_string())
                        })?;
                        Ok(PlannedTransfer {
                            transfer,
                            from_name: (*from_name).to_string(),
                            to_name: (*to_name).to_string(),
                        })
                    })
                    .collect::<ResultEngine<Vec<_>>>()?;

                Ok(SettlementPlan {
                    currency: sheet.currency,
                    transfers,
                })
            })
        })
        .await
    }

    /// Aggregates the group ledger into per-member positions.
    ///
    /// Reads expenses, splits and settlements inside the caller's
    /// transaction, so the whole sheet reflects one consistent snapshot.
    pub(super) async fn balance_sheet(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<BalanceSheet> {
        let group = self
            .find_group_by_id(db_tx, group_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        let currency = model_currency(&group.currency)?;

        let roster = self.group_roster(db_tx, group_id).await?;
        let member_ids: Vec<i64> = roster.iter().map(|(user, _)| user.id).collect();

        let facts = self.load_group_facts(db_tx, group_id).await?;
        let balances = aggregate_balances(&member_ids, &facts, currency)?;

        let names: HashMap<i64, &str> = roster
            .iter()
            .map(|(user, _)| (user.id, user.display_name.as_str()))
            .collect();

        let positions = balances
            .into_iter()
            .map(|balance| {
                let display_name = names
                    .get(&balance.member_id)
                    .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
                Ok(MemberPosition {
                    balance,
                    display_name: (*display_name).to_string(),
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(BalanceSheet {
            currency,
            positions,
        })
    }

    /// Materializes the group ledger as aggregation facts.
    async fn load_group_facts(
        &self,
        db_tx: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<LedgerFact>> {
        let expense_models: Vec<expenses::Model> = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .all(db_tx)
            .await?;
        let expense_ids: Vec<String> = expense_models.iter().map(|m| m.id.clone()).collect();
        let split_models: Vec<expense_splits::Model> = expense_splits::Entity::find()
            .filter(expense_splits::Column::ExpenseId.is_in(expense_ids))
            .all(db_tx)
            .await?;
        let settlement_models: Vec<settlements::Model> = settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id.to_string()))
            .all(db_tx)
            .await?;

        let mut facts = Vec::new();
        for expense in &expense_models {
            facts.push(LedgerFact::Paid {
                member_id: expense.paid_by,
                amount: MoneyCents::new(expense.amount_minor),
                currency: model_currency(&expense.currency)?,
            });
        }
        for split in &split_models {
            let expense = expense_models
                .iter()
                .find(|e| e.id == split.expense_id)
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            facts.push(LedgerFact::Owed {
                member_id: split.member_id,
                amount: MoneyCents::new(split.amount_minor),
                currency: model_currency(&expense.currency)?,
            });
        }
        for settlement in &settlement_models {
            facts.push(LedgerFact::Settled {
                from_member_id: settlement.from_member_id,
                to_member_id: settlement.to_member_id,
                amount: MoneyCents::new(settlement.amount_minor),
                currency: model_currency(&settlement.currency)?,
            });
        }

        Ok(facts)
    }
}
