//! Net-balance aggregation over a group's ledger facts.
//!
//! [`aggregate_balances`] reduces the raw financial facts of one group
//! (who paid what, who owes which share, who already paid whom back) into
//! one signed net balance per member. It is a pure function over the
//! supplied facts: no I/O, no clock, no hidden state, so calling it twice
//! on the same input yields the same output.
//!
//! All facts must carry the same currency. The caller states the expected
//! currency explicitly; any fact in another currency is a precondition
//! violation, not something to convert or skip.

use std::collections::{HashMap, HashSet};

use crate::{Currency, EngineError, MoneyCents, ResultEngine};

/// A single financial fact in a group's ledger.
///
/// Sign conventions match double-entry bookkeeping from the member's point
/// of view: paying for the group is a credit, owing a share is a debit, and
/// a recorded repayment credits the payer and debits the receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerFact {
    /// A member covered `amount` of an expense up-front.
    Paid {
        member_id: i64,
        amount: MoneyCents,
        currency: Currency,
    },
    /// A member owes `amount` as their share of an expense.
    Owed {
        member_id: i64,
        amount: MoneyCents,
        currency: Currency,
    },
    /// A recorded repayment from one member to another.
    Settled {
        from_member_id: i64,
        to_member_id: i64,
        amount: MoneyCents,
        currency: Currency,
    },
}

impl LedgerFact {
    fn amount(&self) -> MoneyCents {
        match *self {
            Self::Paid { amount, .. } | Self::Owed { amount, .. } | Self::Settled { amount, .. } => {
                amount
            }
        }
    }

    fn currency(&self) -> Currency {
        match *self {
            Self::Paid { currency, .. }
            | Self::Owed { currency, .. }
            | Self::Settled { currency, .. } => currency,
        }
    }
}

/// A member's signed net position within a group, in minor units.
///
/// Positive means the member is owed money (creditor), negative means the
/// member owes (debtor). Display-name and currency enrichment is the
/// calling layer's job; the settlement math only ever sees `{id, amount}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberBalance {
    pub member_id: i64,
    pub amount: MoneyCents,
}

/// Reduces `facts` to one net balance per member.
///
/// Returns one entry per member of `members` that appears in at least one
/// fact, in roster order; balances may be zero. Errors with
/// [`EngineError::InvalidInput`] on a fact in a currency other than
/// `currency`, a fact referencing a member outside `members`, a
/// non-positive amount, or a self-referential settlement.
pub fn aggregate_balances(
    members: &[i64],
    facts: &[LedgerFact],
    currency: Currency,
) -> ResultEngine<Vec<MemberBalance>> {
    let roster: HashSet<i64> = members.iter().copied().collect();
    let mut totals: HashMap<i64, MoneyCents> = HashMap::new();
    let mut touched: HashSet<i64> = HashSet::new();

    let require_member = |roster: &HashSet<i64>, member_id: i64| -> ResultEngine<()> {
        if !roster.contains(&member_id) {
            return Err(EngineError::InvalidInput(format!(
                "fact references member {member_id}, who is not in the group"
            )));
        }
        Ok(())
    };

    for fact in facts {
        if fact.currency() != currency {
            return Err(EngineError::InvalidInput(format!(
                "mixed currencies: expected {}, got {}",
                currency.code(),
                fact.currency().code()
            )));
        }
        if !fact.amount().is_positive() {
            return Err(EngineError::InvalidInput(
                "fact amount must be > 0".to_string(),
            ));
        }

        match *fact {
            LedgerFact::Paid {
                member_id, amount, ..
            } => {
                require_member(&roster, member_id)?;
                *totals.entry(member_id).or_insert(MoneyCents::ZERO) += amount;
                touched.insert(member_id);
            }
            LedgerFact::Owed {
                member_id, amount, ..
            } => {
                require_member(&roster, member_id)?;
                *totals.entry(member_id).or_insert(MoneyCents::ZERO) -= amount;
                touched.insert(member_id);
            }
            LedgerFact::Settled {
                from_member_id,
                to_member_id,
                amount,
                ..
            } => {
                if from_member_id == to_member_id {
                    return Err(EngineError::InvalidInput(
                        "settlement from and to must differ".to_string(),
                    ));
                }
                require_member(&roster, from_member_id)?;
                require_member(&roster, to_member_id)?;
                *totals.entry(from_member_id).or_insert(MoneyCents::ZERO) += amount;
                *totals.entry(to_member_id).or_insert(MoneyCents::ZERO) -= amount;
                touched.insert(from_member_id);
                touched.insert(to_member_id);
            }
        }
    }

    Ok(members
        .iter()
        .filter(|id| touched.contains(*id))
        .map(|&member_id| MemberBalance {
            member_id,
            amount: totals.get(&member_id).copied().unwrap_or(MoneyCents::ZERO),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EUR: Currency = Currency::Eur;

    fn paid(member_id: i64, cents: i64) -> LedgerFact {
        LedgerFact::Paid {
            member_id,
            amount: MoneyCents::new(cents),
            currency: EUR,
        }
    }

    fn owed(member_id: i64, cents: i64) -> LedgerFact {
        LedgerFact::Owed {
            member_id,
            amount: MoneyCents::new(cents),
            currency: EUR,
        }
    }

    fn settled(from: i64, to: i64, cents: i64) -> LedgerFact {
        LedgerFact::Settled {
            from_member_id: from,
            to_member_id: to,
            amount: MoneyCents::new(cents),
            currency: EUR,
        }
    }

    #[test]
    fn credits_payer_and_debits_participants() {
        // 30.00 paid by 1, split evenly across 1..3.
        let facts = vec![paid(1, 3000), owed(1, 1000), owed(2, 1000), owed(3, 1000)];
        let balances = aggregate_balances(&[1, 2, 3], &facts, EUR).unwrap();

        assert_eq!(
            balances,
            vec![
                MemberBalance {
                    member_id: 1,
                    amount: MoneyCents::new(2000)
                },
                MemberBalance {
                    member_id: 2,
                    amount: MoneyCents::new(-1000)
                },
                MemberBalance {
                    member_id: 3,
                    amount: MoneyCents::new(-1000)
                },
            ]
        );
    }

    #[test]
    fn recorded_settlement_offsets_the_debt() {
        let facts = vec![paid(1, 2000), owed(2, 2000), settled(2, 1, 2000)];
        let balances = aggregate_balances(&[1, 2], &facts, EUR).unwrap();

        assert!(balances.iter().all(|b| b.amount.is_zero()));
    }

    #[test]
    fn members_without_facts_are_omitted() {
        let facts = vec![paid(1, 500), owed(2, 500)];
        let balances = aggregate_balances(&[1, 2, 3], &facts, EUR).unwrap();

        assert_eq!(balances.len(), 2);
        assert!(balances.iter().all(|b| b.member_id != 3));
    }

    #[test]
    fn zero_balance_members_with_facts_are_included() {
        let facts = vec![paid(1, 500), owed(1, 500), paid(2, 300), owed(2, 300)];
        let balances = aggregate_balances(&[1, 2], &facts, EUR).unwrap();

        assert_eq!(balances.len(), 2);
        assert!(balances.iter().all(|b| b.amount.is_zero()));
    }

    #[test]
    fn rejects_mixed_currencies() {
        let facts = vec![
            paid(1, 500),
            LedgerFact::Owed {
                member_id: 2,
                amount: MoneyCents::new(500),
                currency: Currency::Usd,
            },
        ];
        let err = aggregate_balances(&[1, 2], &facts, EUR).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_unknown_member() {
        let facts = vec![paid(42, 500)];
        let err = aggregate_balances(&[1, 2], &facts, EUR).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let facts = vec![paid(1, 0)];
        assert!(aggregate_balances(&[1], &facts, EUR).is_err());

        let facts = vec![owed(1, -100)];
        assert!(aggregate_balances(&[1], &facts, EUR).is_err());
    }

    #[test]
    fn rejects_self_settlement() {
        let facts = vec![settled(1, 1, 500)];
        assert!(aggregate_balances(&[1], &facts, EUR).is_err());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let facts = vec![paid(1, 3000), owed(2, 1500), owed(3, 1500), settled(2, 1, 700)];
        let first = aggregate_balances(&[1, 2, 3], &facts, EUR).unwrap();
        let second = aggregate_balances(&[1, 2, 3], &facts, EUR).unwrap();
        assert_eq!(first, second);
    }
}
