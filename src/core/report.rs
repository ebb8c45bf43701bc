//! Spending reports over the wallet ledger.
//!
//! All functions are pure and work on the in-memory ledger, so they can be
//! called from any front end without touching the database.

use crate::core::wallet::{Category, Direction, TransactionRecord, Wallet};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Money in, money out, and the difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    /// Sum of credit entries
    pub credits: Decimal,
    /// Sum of debit entries
    pub debits: Decimal,
    /// Credits minus debits
    pub net: Decimal,
    /// Entries counted
    pub count: usize,
}

/// Inclusive time window; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    /// Earliest entry to include
    pub from: Option<DateTime<Utc>>,
    /// Latest entry to include
    pub to: Option<DateTime<Utc>>,
}

impl Period {
    /// Every entry ever recorded.
    #[must_use]
    pub const fn all_time() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    fn contains(&self, date: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

fn in_period<'a>(
    wallet: &'a Wallet,
    period: Period,
) -> impl Iterator<Item = &'a TransactionRecord> {
    wallet
        .transactions()
        .filter(move |tx| period.contains(tx.date))
}

/// Totals of all entries in the period.
#[must_use]
pub fn totals(wallet: &Wallet, period: Period) -> LedgerTotals {
    let mut totals = LedgerTotals::default();
    for tx in in_period(wallet, period) {
        match tx.direction {
            Direction::Credit => totals.credits = totals.credits.saturating_add(tx.amount),
            Direction::Debit => totals.debits = totals.debits.saturating_add(tx.amount),
        }
        totals.count += 1;
    }
    totals.net = totals.credits.saturating_sub(totals.debits);
    totals
}

/// Debit totals per category in the period, ordered by category.
#[must_use]
pub fn spending_by_category(wallet: &Wallet, period: Period) -> BTreeMap<Category, Decimal> {
    let mut spending = BTreeMap::new();
    for tx in in_period(wallet, period).filter(|tx| tx.direction == Direction::Debit) {
        let sum = spending.entry(tx.category).or_insert(Decimal::ZERO);
        *sum = sum.saturating_add(tx.amount);
    }
    spending
}

/// Share of total spending per category, as percentages summing to 100.
#[must_use]
pub fn spending_shares(wallet: &Wallet, period: Period) -> BTreeMap<Category, Decimal> {
    let spending = spending_by_category(wallet, period);
    let total = spending
        .values()
        .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(*amount));
    if total <= Decimal::ZERO {
        return BTreeMap::new();
    }
    spending
        .into_iter()
        .map(|(category, amount)| (category, amount / total * Decimal::ONE_HUNDRED))
        .collect()
}
