//! Settlement records.
//!
//! A `Settlement` is a repayment one member made to another outside the
//! expense flow (cash, bank transfer). Once recorded it becomes an
//! offsetting entry in the group ledger: the payer is credited, the receiver
//! debited, which moves both net balances toward zero on the next
//! aggregation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents, ResultEngine};

/// A recorded repayment between two group members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: String,
    pub from_member_id: i64,
    pub to_member_id: i64,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub created_by: i64,
    pub occurred_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        group_id: String,
        from_member_id: i64,
        to_member_id: i64,
        amount: MoneyCents,
        currency: Currency,
        created_by: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidInput(
                "settlement amount must be > 0".to_string(),
            ));
        }
        if from_member_id == to_member_id {
            return Err(EngineError::InvalidInput(
                "from_member_id and to_member_id must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            from_member_id,
            to_member_id,
            amount,
            currency,
            created_by,
            occurred_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub from_member_id: i64,
    pub to_member_id: i64,
    pub amount_minor: i64,
    pub currency: String,
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
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Settlement> for ActiveModel {
    fn from(settlement: &Settlement) -> Self {
        Self {
            id: ActiveValue::Set(settlement.id.to_string()),
            group_id: ActiveValue::Set(settlement.group_id.clone()),
            from_member_id: ActiveValue::Set(settlement.from_member_id),
            to_member_id: ActiveValue::Set(settlement.to_member_id),
            amount_minor: ActiveValue::Set(settlement.amount.cents()),
            currency: ActiveValue::Set(settlement.currency.code().to_string()),
            created_by: ActiveValue::Set(settlement.created_by),
            occurred_at: ActiveValue::Set(settlement.occurred_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_self_settlement() {
        let result = Settlement::new(
            "group".to_string(),
            1,
            1,
            MoneyCents::new(100),
            Currency::Eur,
            1,
            Utc::now(),
        );
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn rejects_non_positive_amount() {
        let result = Settlement::new(
            "group".to_string(),
            1,
            2,
            MoneyCents::ZERO,
            Currency::Eur,
            1,
            Utc::now(),
        );
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }
}
