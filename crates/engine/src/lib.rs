//! Shared-expense engine: groups, expenses, splits, settlements.
//!
//! The heart of the crate is pure settlement math:
//!
//! - [`aggregate_balances`] reduces a group's ledger facts to one signed
//!   net balance per member.
//! - [`plan_settlement`] turns those balances into a minimal list of
//!   pairwise transfers that settles the group.
//!
//! Around it, [`Engine`] provides the database-backed operations (create
//! groups, record expenses and settlements, read balances and plans) that
//! feed the math and persist its inputs.

pub use balance::{LedgerFact, MemberBalance, aggregate_balances};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::{Expense, SplitShare, split_even};
pub use group_memberships::MemberRole;
pub use groups::Group;
pub use money::MoneyCents;
pub use ops::{
    BalanceSheet, Engine, EngineBuilder, MemberPosition, PlannedTransfer, SettlementPlan,
};
pub use settlement_plan::{SETTLE_EPSILON, Transfer, plan_settlement};
pub use settlements::Settlement;

mod balance;
mod currency;
mod error;
mod expense_splits;
mod expenses;
mod group_memberships;
mod groups;
mod money;
mod ops;
mod settlement_plan;
mod settlements;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
