//! Expense split rows.
//!
//! One row per `(expense, member)` pair holding the member's owed share in
//! minor units. Rows are written together with their expense and never
//! updated independently.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::expenses::SplitShare;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: i64,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<(Uuid, &SplitShare)> for ActiveModel {
    fn from((expense_id, split): (Uuid, &SplitShare)) -> Self {
        Self {
            expense_id: ActiveValue::Set(expense_id.to_string()),
            member_id: ActiveValue::Set(split.member_id),
            amount_minor: ActiveValue::Set(split.amount.cents()),
        }
    }
}
