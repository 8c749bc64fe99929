//! Expense primitives.
//!
//! An `Expense` is a payment one member made on behalf of the group,
//! split across participants. The payer is credited the full amount; each
//! participant is debited their share. Shares are stored as signed integer
//! **minor units** and must sum exactly to the expense amount, so the group
//! ledger stays zero-sum by construction.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents, ResultEngine};

/// One participant's share of an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitShare {
    pub member_id: i64,
    pub amount: MoneyCents,
}

/// A group expense with its splits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub paid_by: i64,
    pub created_by: i64,
    pub occurred_at: DateTime<Utc>,
    pub splits: Vec<SplitShare>,
}

impl Expense {
    pub fn new(
        group_id: String,
        description: String,
        amount: MoneyCents,
        currency: Currency,
        paid_by: i64,
        created_by: i64,
        occurred_at: DateTime<Utc>,
        splits: Vec<SplitShare>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidInput(
                "expense amount must be > 0".to_string(),
            ));
        }
        if splits.is_empty() {
            return Err(EngineError::InvalidInput(
                "expense needs at least one split".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        let mut total = MoneyCents::ZERO;
        for split in &splits {
            if !split.amount.is_positive() {
                return Err(EngineError::InvalidInput(
                    "split amount must be > 0".to_string(),
                ));
            }
            if !seen.insert(split.member_id) {
                return Err(EngineError::InvalidInput(format!(
                    "duplicate split for member {}",
                    split.member_id
                )));
            }
            total += split.amount;
        }
        if total != amount {
            return Err(EngineError::InvalidInput(format!(
                "splits sum to {total}, expense amount is {amount}"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            description,
            amount,
            currency,
            paid_by,
            created_by,
            occurred_at,
            splits,
        })
    }
}

/// Splits `amount` evenly across `members`.
///
/// Integer division leaves up to `members.len() - 1` minor units over; the
/// remainder is handed out one minor unit each to the earliest members in
/// roster order, so shares always sum exactly to `amount` and the same
/// roster yields the same shares.
pub fn split_even(amount: MoneyCents, members: &[i64]) -> ResultEngine<Vec<SplitShare>> {
    if members.is_empty() {
        return Err(EngineError::InvalidInput(
            "cannot split across an empty roster".to_string(),
        ));
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidInput(
            "expense amount must be > 0".to_string(),
        ));
    }

    let n = members.len() as i64;
    let base = amount.cents() / n;
    let remainder = amount.cents() % n;

    Ok(members
        .iter()
        .enumerate()
        .map(|(i, &member_id)| SplitShare {
            member_id,
            amount: MoneyCents::new(base + i64::from((i as i64) < remainder)),
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub paid_by: i64,
    pub created_by: i64,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    Splits,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            paid_by: ActiveValue::Set(expense.paid_by),
            created_by: ActiveValue::Set(expense.created_by),
            occurred_at: ActiveValue::Set(expense.occurred_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense_with_splits(amount: i64, shares: &[(i64, i64)]) -> ResultEngine<Expense> {
        Expense::new(
            "group".to_string(),
            "Dinner".to_string(),
            MoneyCents::new(amount),
            Currency::Eur,
            1,
            1,
            Utc::now(),
            shares
                .iter()
                .map(|&(member_id, cents)| SplitShare {
                    member_id,
                    amount: MoneyCents::new(cents),
                })
                .collect(),
        )
    }

    #[test]
    fn splits_must_sum_to_amount() {
        assert!(expense_with_splits(1000, &[(1, 500), (2, 500)]).is_ok());
        assert!(matches!(
            expense_with_splits(1000, &[(1, 500), (2, 400)]),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_duplicate_split_member() {
        assert!(matches!(
            expense_with_splits(1000, &[(1, 500), (1, 500)]),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn split_even_distributes_remainder_to_earliest_members() {
        let shares = split_even(MoneyCents::new(1000), &[7, 8, 9]).unwrap();
        let cents: Vec<i64> = shares.iter().map(|s| s.amount.cents()).collect();
        assert_eq!(cents, vec![334, 333, 333]);
        assert_eq!(cents.iter().sum::<i64>(), 1000);
    }

    #[test]
    fn split_even_exact_division_has_no_remainder() {
        let shares = split_even(MoneyCents::new(900), &[1, 2, 3]).unwrap();
        assert!(shares.iter().all(|s| s.amount.cents() == 300));
    }

    #[test]
    fn split_even_rejects_empty_roster() {
        assert!(split_even(MoneyCents::new(100), &[]).is_err());
    }
}
