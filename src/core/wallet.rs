//! Wallet ledger business logic.
//!
//! A [`Wallet`] keeps a spendable balance next to an append-only list of
//! [`TransactionRecord`]s. Every operation validates its input, checks the
//! balance it is about to draw from, and only then mutates state and appends
//! exactly one record. A rejected operation leaves the wallet untouched.
//!
//! Agent-role users additionally hold an [`AgentAccount`] (float plus earned
//! commission) that is kept separate from the personal wallet.

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reward points earned per currency unit spent through [`Wallet::pay`].
pub const REWARD_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
/// Fee charged on cross-border transfers.
pub const REMITTANCE_FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);
/// Currency value of a single reward point when redeemed.
pub const POINT_VALUE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
/// Agent commission on cash-in.
pub const CASH_IN_COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);
/// Agent commission on cash-out.
pub const CASH_OUT_COMMISSION_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Direction of money flow relative to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money entering the wallet
    Credit,
    /// Money leaving the wallet
    Debit,
}

/// Ledger category of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Food orders
    Food,
    /// Ride fares
    Ride,
    /// Marketplace purchases
    Shop,
    /// Peer transfers and top-ups
    Transfer,
    /// Utility bills and premiums
    Bill,
    /// Loan draw-downs and repayments
    Loan,
    /// Savings and investments
    Savings,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Food => "Food",
            Self::Ride => "Ride",
            Self::Shop => "Shop",
            Self::Transfer => "Transfer",
            Self::Bill => "Bill",
            Self::Loan => "Loan",
            Self::Savings => "Savings",
        };
        f.write_str(label)
    }
}

/// How a top-up was funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingMethod {
    /// Debit or credit card
    Card,
    /// Bank transfer
    Bank,
    /// Another mobile-money provider
    MobileMoney,
    /// Cash handed to an agent
    Agent,
}

/// Loan products and the amount owed per unit of principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    /// Buy-now-pay-later, interest free
    Bnpl,
    /// Personal loan with 5% flat interest
    Personal,
}

impl LoanKind {
    /// Multiplier applied to the principal to get the amount due.
    #[must_use]
    pub const fn repayment_factor(self) -> Decimal {
        match self {
            Self::Bnpl => Decimal::ONE,
            Self::Personal => Decimal::from_parts(105, 0, 0, false, 2),
        }
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title shown in the history
    pub title: String,
    /// Positive amount moved, fees included
    pub amount: Decimal,
    /// When the entry was recorded
    pub date: DateTime<Utc>,
    /// Credit or debit
    pub direction: Direction,
    /// Ledger category
    pub category: Category,
    /// Funding method, only set for top-ups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<FundingMethod>,
}

impl TransactionRecord {
    fn new(
        title: impl Into<String>,
        amount: Decimal,
        direction: Direction,
        category: Category,
        method: Option<FundingMethod>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            amount,
            date: Utc::now(),
            direction,
            category,
            method,
        }
    }
}

/// The user's wallet: balances plus the ledger backing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    balance: Decimal,
    savings: Decimal,
    loan_due: Decimal,
    points: u64,
    /// Newest first
    transactions: VecDeque<TransactionRecord>,
}

/// Rejects zero and negative amounts.
pub(crate) fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// `held + amount`, rejecting the amount if the sum does not fit.
fn checked_sum(held: Decimal, amount: Decimal) -> Result<Decimal> {
    held.checked_add(amount).ok_or(Error::InvalidAmount { amount })
}

impl Wallet {
    /// Creates a wallet with the given opening values and an empty ledger.
    #[must_use]
    pub const fn new(balance: Decimal, savings: Decimal, loan_due: Decimal, points: u64) -> Self {
        Self {
            balance,
            savings,
            loan_due,
            points,
            transactions: VecDeque::new(),
        }
    }

    /// Spendable balance.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Amount held in savings.
    #[must_use]
    pub const fn savings(&self) -> Decimal {
        self.savings
    }

    /// Outstanding loan amount.
    #[must_use]
    pub const fn loan_due(&self) -> Decimal {
        self.loan_due
    }

    /// Reward points collected.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Ledger entries, newest first.
    pub fn transactions(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.transactions.iter()
    }

    /// Number of ledger entries.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Ledger entries of one category, newest first.
    pub fn transactions_by_category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &TransactionRecord> {
        self.transactions
            .iter()
            .filter(move |tx| tx.category == category)
    }

    /// Looks up a ledger entry by id.
    #[must_use]
    pub fn find_transaction(&self, id: Uuid) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    fn record(&mut self, record: TransactionRecord) -> TransactionRecord {
        self.transactions.push_front(record.clone());
        record
    }

    /// Draws `total` from the balance, or fails without touching anything.
    fn debit(
        &mut self,
        total: Decimal,
        title: impl Into<String>,
        category: Category,
    ) -> Result<TransactionRecord> {
        if self.balance < total {
            warn!(
                balance = %self.balance,
                required = %total,
                %category,
                "Debit rejected: insufficient funds"
            );
            return Err(Error::InsufficientFunds {
                current: self.balance,
                required: total,
            });
        }
        self.balance -= total;
        let record = TransactionRecord::new(title, total, Direction::Debit, category, None);
        debug!(id = %record.id, amount = %total, %category, "Debit recorded");
        Ok(self.record(record))
    }

    fn credit(
        &mut self,
        amount: Decimal,
        title: impl Into<String>,
        category: Category,
        method: Option<FundingMethod>,
    ) -> Result<TransactionRecord> {
        self.balance = checked_sum(self.balance, amount)?;
        let record = TransactionRecord::new(title, amount, Direction::Credit, category, method);
        debug!(id = %record.id, %amount, %category, "Credit recorded");
        Ok(self.record(record))
    }

    /// Pays for a purchase or service and earns reward points.
    ///
    /// Points earned are `floor(amount * REWARD_RATE)`.
    pub fn pay(
        &mut self,
        amount: Decimal,
        title: &str,
        category: Category,
    ) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let record = self.debit(amount, title, category)?;
        let earned = (amount * REWARD_RATE).floor().to_u64().unwrap_or(u64::MAX);
        self.points = self.points.saturating_add(earned);
        info!(%amount, title, earned, "Payment completed");
        Ok(record)
    }

    /// Sends money to another person. Cross-border transfers carry a 2% fee
    /// which is debited together with the amount.
    pub fn send_money(
        &mut self,
        recipient: &str,
        amount: Decimal,
        cross_border: bool,
    ) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        if recipient.trim().is_empty() {
            return Err(Error::MissingField { field: "recipient" });
        }
        let fee = if cross_border {
            amount * REMITTANCE_FEE_RATE
        } else {
            Decimal::ZERO
        };
        let title = if cross_border {
            format!("International transfer to {}", recipient.trim())
        } else {
            format!("Sent to {}", recipient.trim())
        };
        let record = self.debit(checked_sum(amount, fee)?, title, Category::Transfer)?;
        info!(%amount, %fee, recipient, "Money sent");
        Ok(record)
    }

    /// Pays a utility bill.
    pub fn pay_bill(&mut self, amount: Decimal, biller: &str) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let record = self.debit(amount, format!("{biller} bill"), Category::Bill)?;
        info!(%amount, biller, "Bill paid");
        Ok(record)
    }

    /// Moves money from the balance into savings.
    pub fn add_to_savings(&mut self, amount: Decimal) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let savings = checked_sum(self.savings, amount)?;
        let record = self.debit(amount, "Savings deposit", Category::Savings)?;
        self.savings = savings;
        info!(%amount, savings = %self.savings, "Savings deposit");
        Ok(record)
    }

    /// Moves money from savings back into the balance.
    pub fn withdraw_savings(&mut self, amount: Decimal) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        if self.savings < amount {
            return Err(Error::InsufficientFunds {
                current: self.savings,
                required: amount,
            });
        }
        let record = self.credit(amount, "Savings withdrawal", Category::Savings, None)?;
        self.savings -= amount;
        info!(%amount, savings = %self.savings, "Savings withdrawal");
        Ok(record)
    }

    /// Buys into an investment product.
    pub fn invest(&mut self, amount: Decimal, product: &str) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let record = self.debit(amount, format!("Investment: {product}"), Category::Savings)?;
        info!(%amount, product, "Investment purchased");
        Ok(record)
    }

    /// Pays an insurance premium.
    pub fn buy_insurance(&mut self, amount: Decimal, plan: &str) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let record = self.debit(amount, format!("Insurance: {plan}"), Category::Bill)?;
        info!(%amount, plan, "Insurance premium paid");
        Ok(record)
    }

    /// Adds money to the wallet from an external source.
    pub fn top_up(&mut self, amount: Decimal, method: FundingMethod) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let record = self.credit(amount, "Wallet top-up", Category::Transfer, Some(method))?;
        info!(%amount, ?method, balance = %self.balance, "Wallet topped up");
        Ok(record)
    }

    /// Draws down a loan: the principal is credited and the amount due grows by
    /// `principal * kind.repayment_factor()`.
    pub fn take_loan(&mut self, amount: Decimal, kind: LoanKind) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        let owed = amount
            .checked_mul(kind.repayment_factor())
            .ok_or(Error::InvalidAmount { amount })?;
        let loan_due = checked_sum(self.loan_due, owed)?;
        let title = match kind {
            LoanKind::Bnpl => "Buy now, pay later",
            LoanKind::Personal => "Personal loan",
        };
        let record = self.credit(amount, title, Category::Loan, None)?;
        self.loan_due = loan_due;
        info!(%amount, ?kind, loan_due = %self.loan_due, "Loan disbursed");
        Ok(record)
    }

    /// Repays part or all of the outstanding loan.
    pub fn repay_loan(&mut self, amount: Decimal) -> Result<TransactionRecord> {
        validate_amount(amount)?;
        if amount > self.loan_due {
            return Err(Error::InvalidAmount { amount });
        }
        let record = self.debit(amount, "Loan repayment", Category::Loan)?;
        self.loan_due -= amount;
        info!(%amount, loan_due = %self.loan_due, "Loan repaid");
        Ok(record)
    }

    /// Converts reward points into balance at [`POINT_VALUE`] per point.
    pub fn redeem_points(&mut self, points: u64) -> Result<TransactionRecord> {
        if points == 0 {
            return Err(Error::InvalidAmount {
                amount: Decimal::ZERO,
            });
        }
        if points > self.points {
            return Err(Error::InsufficientFunds {
                current: Decimal::from(self.points),
                required: Decimal::from(points),
            });
        }
        let value = Decimal::from(points) * POINT_VALUE;
        let record = self.credit(value, "Reward points redeemed", Category::Transfer, None)?;
        self.points -= points;
        info!(points, %value, "Reward points redeemed");
        Ok(record)
    }
}

/// Receipt for an agent cash operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReceipt {
    /// Customer served
    pub customer: String,
    /// Amount exchanged
    pub amount: Decimal,
    /// Commission earned on this operation
    pub commission: Decimal,
    /// When the operation happened
    pub date: DateTime<Utc>,
}

/// Float and commission of an agent-role user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAccount {
    balance: Decimal,
    commission: Decimal,
}

impl AgentAccount {
    /// Creates an agent account with the given float and accrued commission.
    #[must_use]
    pub const fn new(balance: Decimal, commission: Decimal) -> Self {
        Self {
            balance,
            commission,
        }
    }

    /// Electronic float available to hand out.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Commission earned so far.
    #[must_use]
    pub const fn commission(&self) -> Decimal {
        self.commission
    }

    /// Customer hands over cash, the agent transfers e-money out of its float.
    /// Fails if the float cannot cover the amount.
    pub fn cash_in(&mut self, customer: &str, amount: Decimal) -> Result<AgentReceipt> {
        validate_amount(amount)?;
        if self.balance < amount {
            warn!(float = %self.balance, %amount, "Cash-in rejected: float too low");
            return Err(Error::InsufficientFunds {
                current: self.balance,
                required: amount,
            });
        }
        let commission = amount * CASH_IN_COMMISSION_RATE;
        self.balance -= amount;
        self.commission = self.commission.saturating_add(commission);
        info!(customer, %amount, %commission, "Agent cash-in");
        Ok(AgentReceipt {
            customer: customer.to_string(),
            amount,
            commission,
            date: Utc::now(),
        })
    }

    /// Customer receives cash, the agent's float grows by the amount.
    pub fn cash_out(&mut self, customer: &str, amount: Decimal) -> Result<AgentReceipt> {
        validate_amount(amount)?;
        let commission = amount * CASH_OUT_COMMISSION_RATE;
        self.balance = checked_sum(self.balance, amount)?;
        self.commission = self.commission.saturating_add(commission);
        info!(customer, %amount, %commission, "Agent cash-out");
        Ok(AgentReceipt {
            customer: customer.to_string(),
            amount,
            commission,
            date: Utc::now(),
        })
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::money;

    fn funded(balance: i64) -> Wallet {
        Wallet::new(Decimal::from(balance), Decimal::ZERO, Decimal::ZERO, 0)
    }

    #[test]
    fn test_pay_debits_and_records() {
        let mut wallet = funded(100);
        let record = wallet
            .pay(Decimal::from(50), "Coffee", Category::Food)
            .unwrap();
        assert_eq!(wallet.balance(), Decimal::from(50));
        assert_eq!(wallet.points(), 5);
        assert_eq!(record.direction, Direction::Debit);
        assert_eq!(record.category, Category::Food);
        assert_eq!(wallet.transaction_count(), 1);
    }

    #[test]
    fn test_pay_points_are_floored() {
        let mut wallet = funded(100);
        wallet.pay(money("19.99"), "Snack", Category::Food).unwrap();
        assert_eq!(wallet.points(), 1);
    }

    #[test]
    fn test_points_saturate_instead_of_overflowing() {
        let mut wallet = Wallet::new(
            Decimal::from(1000),
            Decimal::ZERO,
            Decimal::ZERO,
            u64::MAX - 1,
        );
        wallet
            .pay(Decimal::from(100), "Groceries", Category::Shop)
            .unwrap();
        assert_eq!(wallet.points(), u64::MAX);
        assert_eq!(wallet.balance(), Decimal::from(900));
    }

    #[test]
    fn test_cent_amounts_are_exact() {
        let mut wallet = Wallet::new(money("0.3"), Decimal::ZERO, Decimal::ZERO, 0);
        for _ in 0..3 {
            wallet.pay(money("0.1"), "Gum", Category::Food).unwrap();
        }
        assert_eq!(wallet.balance(), Decimal::ZERO);

        let mut wallet = funded(0);
        for _ in 0..10 {
            wallet.top_up(money("0.1"), FundingMethod::Card).unwrap();
        }
        assert_eq!(wallet.balance(), Decimal::ONE);
        wallet.pay(Decimal::ONE, "Candy", Category::Food).unwrap();
        assert_eq!(wallet.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_pay_bill_insufficient_funds_leaves_wallet_untouched() {
        let mut wallet = funded(10);
        let err = wallet.pay_bill(Decimal::from(45), "Water").unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(wallet.balance(), Decimal::from(10));
        assert_eq!(wallet.points(), 0);
        assert_eq!(wallet.transaction_count(), 0);
    }

    #[test]
    fn test_every_debit_rejects_overdraft() {
        let amount = Decimal::from(1000);
        let debits: [fn(&mut Wallet, Decimal) -> Result<TransactionRecord>; 6] = [
            |w, a| w.pay(a, "Phone", Category::Shop),
            |w, a| w.send_money("Abebe", a, false),
            |w, a| w.pay_bill(a, "Electricity"),
            |w, a| w.add_to_savings(a),
            |w, a| w.invest(a, "Treasury bill"),
            |w, a| w.buy_insurance(a, "Health"),
        ];
        for debit in debits {
            let mut wallet = funded(100);
            assert!(matches!(
                debit(&mut wallet, amount),
                Err(Error::InsufficientFunds { .. })
            ));
            assert_eq!(wallet.balance(), Decimal::from(100));
            assert_eq!(wallet.savings(), Decimal::ZERO);
            assert_eq!(wallet.transaction_count(), 0);
        }
    }

    #[test]
    fn test_every_debit_appends_one_record() {
        let amount = money("40.25");
        // (operation, extra charged on top of the amount)
        let debits: [(fn(&mut Wallet, Decimal) -> Result<TransactionRecord>, Decimal); 7] = [
            (|w, a| w.pay(a, "Phone", Category::Shop), Decimal::ZERO),
            (|w, a| w.send_money("Abebe", a, false), Decimal::ZERO),
            (|w, a| w.send_money("Abebe", a, true), money("0.805")),
            (|w, a| w.pay_bill(a, "Electricity"), Decimal::ZERO),
            (|w, a| w.add_to_savings(a), Decimal::ZERO),
            (|w, a| w.invest(a, "Treasury bill"), Decimal::ZERO),
            (|w, a| w.buy_insurance(a, "Health"), Decimal::ZERO),
        ];
        for (debit, fee) in debits {
            let mut wallet = funded(100);
            let record = debit(&mut wallet, amount).unwrap();
            assert_eq!(record.direction, Direction::Debit);
            assert_eq!(record.amount, amount + fee);
            assert_eq!(wallet.balance(), Decimal::from(100) - amount - fee);
            assert_eq!(wallet.transaction_count(), 1);
        }

        let mut wallet = Wallet::new(Decimal::from(100), Decimal::ZERO, Decimal::from(60), 0);
        let record = wallet.repay_loan(amount).unwrap();
        assert_eq!(record.direction, Direction::Debit);
        assert_eq!(record.category, Category::Loan);
        assert_eq!(wallet.balance(), Decimal::from(100) - amount);
        assert_eq!(wallet.loan_due(), Decimal::from(60) - amount);
        assert_eq!(wallet.transaction_count(), 1);
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let mut wallet = funded(100);
        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            assert!(matches!(
                wallet.pay(amount, "x", Category::Shop),
                Err(Error::InvalidAmount { .. })
            ));
            assert!(matches!(
                wallet.top_up(amount, FundingMethod::Bank),
                Err(Error::InvalidAmount { .. })
            ));
        }
        assert_eq!(wallet.transaction_count(), 0);
    }

    #[test]
    fn test_top_up_overflow_is_rejected() {
        let mut wallet = Wallet::new(Decimal::MAX, Decimal::ZERO, Decimal::ZERO, 0);
        assert!(matches!(
            wallet.top_up(Decimal::ONE, FundingMethod::Card),
            Err(Error::InvalidAmount { .. })
        ));
        assert_eq!(wallet.balance(), Decimal::MAX);
        assert_eq!(wallet.transaction_count(), 0);
    }

    #[test]
    fn test_cross_border_transfer_charges_fee() {
        let mut wallet = funded(200);
        let record = wallet
            .send_money("Family", Decimal::from(100), true)
            .unwrap();
        assert_eq!(record.amount, Decimal::from(102));
        assert_eq!(record.title, "International transfer to Family");
        assert_eq!(wallet.balance(), Decimal::from(98));
        assert!(wallet.send_money("Family", Decimal::from(97), true).is_err());
        assert_eq!(wallet.balance(), Decimal::from(98));
    }

    #[test]
    fn test_domestic_transfer_requires_recipient() {
        let mut wallet = funded(200);
        assert!(matches!(
            wallet.send_money("  ", Decimal::from(10), false),
            Err(Error::MissingField { field: "recipient" })
        ));
        let record = wallet
            .send_money("Abebe", Decimal::from(10), false)
            .unwrap();
        assert_eq!(record.title, "Sent to Abebe");
    }

    #[test]
    fn test_credits_always_append_one_record() {
        let mut wallet = funded(0);
        let before = wallet.transaction_count();
        let record = wallet
            .top_up(Decimal::from(250), FundingMethod::MobileMoney)
            .unwrap();
        assert_eq!(record.direction, Direction::Credit);
        assert_eq!(record.method, Some(FundingMethod::MobileMoney));
        assert_eq!(wallet.transaction_count(), before + 1);
        assert_eq!(wallet.balance(), Decimal::from(250));
    }

    #[test]
    fn test_every_credit_appends_one_record() {
        let amount = Decimal::from(30);
        let credits: [fn(&mut Wallet) -> Result<TransactionRecord>; 2] = [
            |w| w.withdraw_savings(Decimal::from(30)),
            |w| w.redeem_points(300),
        ];
        for credit in credits {
            let mut wallet = Wallet::new(Decimal::from(100), Decimal::from(50), Decimal::ZERO, 400);
            let record = credit(&mut wallet).unwrap();
            assert_eq!(record.direction, Direction::Credit);
            assert_eq!(record.amount, amount);
            assert_eq!(wallet.balance(), Decimal::from(130));
            assert_eq!(wallet.transaction_count(), 1);
        }
    }

    #[test]
    fn test_loans_accumulate_amount_due() {
        let mut wallet = funded(0);
        wallet
            .take_loan(Decimal::from(100), LoanKind::Bnpl)
            .unwrap();
        wallet
            .take_loan(Decimal::from(200), LoanKind::Personal)
            .unwrap();
        assert_eq!(wallet.loan_due(), Decimal::from(310));
        assert_eq!(wallet.balance(), Decimal::from(300));
        assert_eq!(wallet.transaction_count(), 2);
    }

    #[test]
    fn test_repay_loan_cannot_exceed_due() {
        let mut wallet = funded(500);
        wallet
            .take_loan(Decimal::from(100), LoanKind::Bnpl)
            .unwrap();
        assert!(matches!(
            wallet.repay_loan(Decimal::from(150)),
            Err(Error::InvalidAmount { .. })
        ));
        wallet.repay_loan(Decimal::from(100)).unwrap();
        assert_eq!(wallet.loan_due(), Decimal::ZERO);
        assert_eq!(wallet.balance(), Decimal::from(500));
    }

    #[test]
    fn test_savings_round_trip() {
        let mut wallet = funded(100);
        wallet.add_to_savings(Decimal::from(40)).unwrap();
        assert_eq!(wallet.savings(), Decimal::from(40));
        assert_eq!(wallet.balance(), Decimal::from(60));
        assert!(matches!(
            wallet.withdraw_savings(Decimal::from(41)),
            Err(Error::InsufficientFunds { .. })
        ));
        wallet.withdraw_savings(Decimal::from(40)).unwrap();
        assert_eq!(wallet.savings(), Decimal::ZERO);
        assert_eq!(wallet.balance(), Decimal::from(100));
    }

    #[test]
    fn test_redeem_points() {
        let mut wallet = Wallet::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 50);
        assert!(matches!(
            wallet.redeem_points(0),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            wallet.redeem_points(51),
            Err(Error::InsufficientFunds { .. })
        ));
        let record = wallet.redeem_points(50).unwrap();
        assert_eq!(record.amount, Decimal::from(5));
        assert_eq!(wallet.points(), 0);
        assert_eq!(wallet.balance(), Decimal::from(5));
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut wallet = funded(100);
        wallet.pay(Decimal::ONE, "first", Category::Food).unwrap();
        wallet.pay(Decimal::ONE, "second", Category::Ride).unwrap();
        let titles: Vec<_> = wallet.transactions().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
        assert_eq!(wallet.transactions_by_category(Category::Ride).count(), 1);
    }

    #[test]
    fn test_find_transaction_by_id() {
        let mut wallet = funded(100);
        let record = wallet.pay(Decimal::from(5), "Tea", Category::Food).unwrap();
        assert_eq!(wallet.find_transaction(record.id), Some(&record));
        assert!(wallet.find_transaction(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_agent_cash_in_checks_float() {
        let mut agent = AgentAccount::new(Decimal::from(1000), Decimal::ZERO);
        let receipt = agent.cash_in("Customer", Decimal::from(400)).unwrap();
        assert_eq!(receipt.commission, Decimal::from(2));
        assert_eq!(agent.balance(), Decimal::from(600));
        assert_eq!(agent.commission(), Decimal::from(2));
        assert!(matches!(
            agent.cash_in("Customer", Decimal::from(601)),
            Err(Error::InsufficientFunds { .. })
        ));
        assert_eq!(agent.balance(), Decimal::from(600));
    }

    #[test]
    fn test_agent_cash_out_earns_commission() {
        let mut agent = AgentAccount::new(Decimal::ZERO, Decimal::ONE);
        agent.cash_out("Customer", Decimal::from(500)).unwrap();
        assert_eq!(agent.balance(), Decimal::from(500));
        assert_eq!(agent.commission(), Decimal::from(6));
    }
}
