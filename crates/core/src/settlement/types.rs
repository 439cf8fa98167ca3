//! Settlement domain types.
//!
//! Amounts are whole yen held in `Decimal`. Split ratios are the share of
//! user1 (the first partner of the couple) in `[0, 1]`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tandem_shared::types::{ExpenseId, UserId};

use super::error::SettlementError;

/// A shared expense as seen by the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Expense identifier.
    pub id: ExpenseId,
    /// Amount in whole yen (must be positive).
    pub amount: Decimal,
    /// The partner who paid.
    pub payer_id: UserId,
    /// User1's share of responsibility in `[0, 1]`.
    pub split_ratio: Decimal,
    /// Expense date, used for period filtering only.
    pub date: NaiveDate,
    /// Whether the expense already belongs to a settlement.
    pub settled: bool,
}

/// The two partners of a couple, in their fixed user1/user2 order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partners {
    /// The reference partner; split ratios express this user's share.
    pub user1_id: UserId,
    /// The other partner.
    pub user2_id: UserId,
}

impl Partners {
    /// Creates a partner pair.
    #[must_use]
    pub const fn new(user1_id: UserId, user2_id: UserId) -> Self {
        Self { user1_id, user2_id }
    }

    /// Returns true if `user_id` is one of the two partners.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        user_id == self.user1_id || user_id == self.user2_id
    }
}

/// An inclusive date range a settlement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl SettlementPeriod {
    /// Creates a period, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SettlementError> {
        if start > end {
            return Err(SettlementError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the period.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the period (inclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Direction of the settling transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhoPaysWhom {
    /// User1 owes user2.
    #[serde(rename = "user1_pays_user2")]
    User1PaysUser2,
    /// User2 owes user1.
    #[serde(rename = "user2_pays_user1")]
    User2PaysUser1,
    /// Nothing is owed.
    #[serde(rename = "none")]
    NoTransfer,
}

impl WhoPaysWhom {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User1PaysUser2 => "user1_pays_user2",
            Self::User2PaysUser1 => "user2_pays_user1",
            Self::NoTransfer => "none",
        }
    }
}

impl fmt::Display for WhoPaysWhom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete money transfer between the partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Partner sending money.
    pub from: UserId,
    /// Partner receiving money.
    pub to: UserId,
    /// Amount in whole yen.
    pub amount: Decimal,
}

/// Outcome of a settlement calculation.
///
/// Invariants (exact, after rounding):
/// - `user1_paid_total + user2_paid_total == user1_should_pay + user2_should_pay`
/// - `settlement_amount == |user1_paid_total - user1_should_pay|`
/// - `settlement_amount == 0` iff `who_pays_whom == NoTransfer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// The reference partner.
    pub user1_id: UserId,
    /// The other partner.
    pub user2_id: UserId,
    /// Amount paid by user1.
    pub user1_paid_total: Decimal,
    /// Amount paid by user2.
    pub user2_paid_total: Decimal,
    /// User1's responsibility.
    pub user1_should_pay: Decimal,
    /// User2's responsibility.
    pub user2_should_pay: Decimal,
    /// Sum of all expense amounts.
    pub total_amount: Decimal,
    /// Size of the settling transfer.
    pub settlement_amount: Decimal,
    /// Direction of the settling transfer.
    pub who_pays_whom: WhoPaysWhom,
    /// Expenses covered, in input order.
    pub expense_ids: Vec<ExpenseId>,
}

impl SettlementResult {
    /// Returns true if a transfer is needed, i.e. a settlement record may be created.
    #[must_use]
    pub fn requires_settlement(&self) -> bool {
        self.who_pays_whom != WhoPaysWhom::NoTransfer
    }

    /// Number of expenses covered.
    #[must_use]
    pub fn expense_count(&self) -> usize {
        self.expense_ids.len()
    }

    /// The transfer that settles the period, if any.
    #[must_use]
    pub fn transfer(&self) -> Option<Transfer> {
        match self.who_pays_whom {
            WhoPaysWhom::User1PaysUser2 => Some(Transfer {
                from: self.user1_id,
                to: self.user2_id,
                amount: self.settlement_amount,
            }),
            WhoPaysWhom::User2PaysUser1 => Some(Transfer {
                from: self.user2_id,
                to: self.user1_id,
                amount: self.settlement_amount,
            }),
            WhoPaysWhom::NoTransfer => None,
        }
    }
}

/// Status of a persisted settlement.
///
/// Valid transitions:
/// - Pending → Completed (money was transferred)
/// - Pending → Cancelled
///
/// Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Confirmed, awaiting the actual transfer.
    Pending,
    /// Transfer done.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl SettlementStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A status change a user may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatusUpdate {
    /// Mark the transfer as done.
    Completed,
    /// Abandon the settlement.
    Cancelled,
}

impl SettlementStatusUpdate {
    /// The status this update moves to.
    #[must_use]
    pub const fn target(self) -> SettlementStatus {
        match self {
            Self::Completed => SettlementStatus::Completed,
            Self::Cancelled => SettlementStatus::Cancelled,
        }
    }
}
