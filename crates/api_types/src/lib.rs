use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        /// Required: groups are mono-currency and never default silently.
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupsResponse {
        pub groups: Vec<GroupView>,
    }
}

pub mod membership {
    use super::*;

    /// Role of a user in a group.
    ///
    /// The server treats roles as:
    /// - `owner`: can manage the roster.
    /// - `member`: can record expenses/settlements and read balances.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Owner,
        Member,
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub user_id: i64,
        pub role: MemberRole,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }

    /// A member with their role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: i64,
        pub username: String,
        pub display_name: String,
        pub role: MemberRole,
    }
}

pub mod expense {
    use super::*;

    /// One participant's owed share, in major units (e.g. euros).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitNew {
        pub user_id: i64,
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        /// Major units; truncated to the currency's minor unit.
        pub amount: f64,
        pub paid_by: i64,
        /// Omit for an even split across the whole roster.
        pub splits: Option<Vec<SplitNew>>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub user_id: i64,
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub amount: f64,
        pub currency: Currency,
        pub paid_by: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub splits: Vec<SplitView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensesResponse {
        pub expenses: Vec<ExpenseView>,
    }

    /// Query parameters for listing expenses.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub limit: Option<u64>,
    }
}

pub mod balance {
    use super::*;

    /// A member's net position.
    ///
    /// Field names are part of the published client contract and stay
    /// camelCase.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemberBalanceView {
        pub member_id: i64,
        pub display_name: String,
        /// Major units; positive = owed money, negative = owes.
        pub net_balance: f64,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub balances: Vec<MemberBalanceView>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub from_user_id: i64,
        pub to_user_id: i64,
        /// Major units; truncated to the currency's minor unit.
        pub amount: f64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementCreated {
        pub id: Uuid,
    }

    /// One proposed repayment in a settlement plan.
    ///
    /// Field names are part of the published client contract and stay
    /// camelCase.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SettlementTransferView {
        pub from_user_id: i64,
        pub from_user_name: String,
        pub to_user_id: i64,
        pub to_user_name: String,
        /// Major units, strictly positive.
        pub amount: f64,
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementPlanResponse {
        pub transfers: Vec<SettlementTransferView>,
    }
}
