//! Settlement status lifecycle.
//!
//! ```text
//! pending --(complete)--> completed
//! pending --(cancel)----> cancelled
//! ```
//!
//! Completed and cancelled settlements are terminal.

use chrono::{DateTime, Utc};
use tandem_shared::types::UserId;

use super::error::SettlementError;
use super::types::{SettlementStatus, SettlementStatusUpdate};

/// An accepted status transition, with who made it and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the change.
    pub from: SettlementStatus,
    /// Status after the change.
    pub to: SettlementStatus,
    /// User who requested the change.
    pub changed_by: UserId,
    /// Time the change was accepted.
    pub changed_at: DateTime<Utc>,
}

/// Stateless service validating settlement status transitions.
pub struct SettlementStatusService;

impl SettlementStatusService {
    /// Mark a pending settlement as completed.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the settlement is pending.
    pub fn complete(
        current: SettlementStatus,
        completed_by: UserId,
    ) -> Result<StatusChange, SettlementError> {
        Self::transition(current, SettlementStatus::Completed, completed_by)
    }

    /// Cancel a pending settlement.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the settlement is pending.
    pub fn cancel(
        current: SettlementStatus,
        cancelled_by: UserId,
    ) -> Result<StatusChange, SettlementError> {
        Self::transition(current, SettlementStatus::Cancelled, cancelled_by)
    }

    /// Apply a user-requested update.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if `current` is already terminal.
    pub fn apply(
        current: SettlementStatus,
        update: SettlementStatusUpdate,
        changed_by: UserId,
    ) -> Result<StatusChange, SettlementError> {
        match update {
            SettlementStatusUpdate::Completed => Self::complete(current, changed_by),
            SettlementStatusUpdate::Cancelled => Self::cancel(current, changed_by),
        }
    }

    /// Check whether a transition is allowed.
    #[must_use]
    pub fn is_valid_transition(from: SettlementStatus, to: SettlementStatus) -> bool {
        matches!(
            (from, to),
            (
                SettlementStatus::Pending,
                SettlementStatus::Completed | SettlementStatus::Cancelled
            )
        )
    }

    fn transition(
        from: SettlementStatus,
        to: SettlementStatus,
        changed_by: UserId,
    ) -> Result<StatusChange, SettlementError> {
        if !Self::is_valid_transition(from, to) {
            return Err(SettlementError::InvalidTransition { from, to });
        }

        Ok(StatusChange {
            from,
            to,
            changed_by,
            changed_at: Utc::now(),
        })
    }
}
