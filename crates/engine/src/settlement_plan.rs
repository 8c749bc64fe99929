//! Greedy construction of a settlement plan from net balances.
//!
//! [`plan_settlement`] turns a list of member balances into an ordered list
//! of pairwise transfers that brings every balance to (approximately) zero,
//! pairing the largest creditor with the largest debtor until both sides
//! are exhausted. The caller's slice is never mutated; the algorithm works
//! on a local copy of the balances.
//!
//! Balances are integer minor units, so amounts below one minor unit cannot
//! exist here; they are truncated away before they reach the planner. The
//! epsilon tolerance therefore only matters in two places: the input is
//! allowed to be off-zero by up to one minor unit (rounding dust from
//! upstream), and after applying the plan each member may be left with up
//! to one minor unit of residual instead of an exact zero.

use crate::{EngineError, MemberBalance, MoneyCents, ResultEngine};

/// Tolerated rounding dust, one minor unit of the settlement currency.
///
/// Scales with the currency's precision automatically: one cent for
/// 2-decimal currencies, one whole unit for 0-decimal ones.
pub const SETTLE_EPSILON: MoneyCents = MoneyCents::new(1);

/// A proposed repayment from one member (`from`, the debtor) to another
/// (`to`, the creditor). Amounts are strictly positive and `from` never
/// equals `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: i64,
    pub to: i64,
    pub amount: MoneyCents,
}

/// Computes a minimal-cardinality list of transfers that settles `balances`.
///
/// Precondition: balances must sum to zero within [`SETTLE_EPSILON`]
/// (every expense credits its payer exactly what the splits debit), else
/// the function fails with [`EngineError::BalanceIntegrity`]. An
/// out-of-balance ledger is an upstream bug, and a partial plan would hide
/// it.
///
/// Guarantees: applying all transfers leaves every member within
/// [`SETTLE_EPSILON`] of zero; at most `nonzero_members - 1` transfers are
/// emitted; no transfer is a self-transfer; and the plan is deterministic,
/// because equal balances are processed in input order (stable sort), so
/// the same input always yields the same plan.
pub fn plan_settlement(balances: &[MemberBalance]) -> ResultEngine<Vec<Transfer>> {
    let total: i64 = balances.iter().map(|b| b.amount.cents()).sum();
    if total.abs() > SETTLE_EPSILON.cents() {
        return Err(EngineError::BalanceIntegrity(format!(
            "balances sum to {total} minor units, expected 0"
        )));
    }

    // Working copies in minor units; creditors hold what they are owed,
    // debtors hold the magnitude of what they owe. The caller's slice
    // stays untouched.
    let mut creditors: Vec<(i64, i64)> = balances
        .iter()
        .filter(|b| b.amount.is_positive())
        .map(|b| (b.member_id, b.amount.cents()))
        .collect();
    let mut debtors: Vec<(i64, i64)> = balances
        .iter()
        .filter(|b| b.amount.is_negative())
        .map(|b| (b.member_id, -b.amount.cents()))
        .collect();

    // Largest first; sort_by is stable, so ties keep input order.
    creditors.sort_by(|a, b| b.1.cmp(&a.1));
    debtors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut transfers = Vec::new();
    let (mut ci, mut di) = (0, 0);
    while ci < creditors.len() && di < debtors.len() {
        let (creditor_id, creditor_due) = creditors[ci];
        let (debtor_id, debtor_due) = debtors[di];

        let amount = creditor_due.min(debtor_due);
        transfers.push(Transfer {
            from: debtor_id,
            to: creditor_id,
            amount: MoneyCents::new(amount),
        });

        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;
        if creditors[ci].1 == 0 {
            ci += 1;
        }
        if debtors[di].1 == 0 {
            di += 1;
        }
    }

    Ok(transfers)
}
