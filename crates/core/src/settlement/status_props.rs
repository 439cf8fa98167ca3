//! Property-based tests for SettlementStatusService.

use proptest::prelude::*;
use tandem_shared::types::UserId;
use uuid::Uuid;

use super::error::SettlementError;
use super::status::SettlementStatusService;
use super::types::{SettlementStatus, SettlementStatusUpdate};

fn arb_status() -> impl Strategy<Value = SettlementStatus> {
    prop_oneof![
        Just(SettlementStatus::Pending),
        Just(SettlementStatus::Completed),
        Just(SettlementStatus::Cancelled),
    ]
}

fn arb_update() -> impl Strategy<Value = SettlementStatusUpdate> {
    prop_oneof![
        Just(SettlementStatusUpdate::Completed),
        Just(SettlementStatusUpdate::Cancelled),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|v| UserId::from(Uuid::from_u128(v)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Pending accepts every update and lands on its target.
    #[test]
    fn prop_pending_accepts_updates(update in arb_update(), user in arb_user()) {
        let change = SettlementStatusService::apply(SettlementStatus::Pending, update, user).unwrap();
        prop_assert_eq!(change.from, SettlementStatus::Pending);
        prop_assert_eq!(change.to, update.target());
        prop_assert_eq!(change.changed_by, user);
    }

    /// Terminal states admit no transition.
    #[test]
    fn prop_terminal_states_are_final(
        current in arb_status(),
        update in arb_update(),
        user in arb_user(),
    ) {
        prop_assume!(current.is_terminal());

        let result = SettlementStatusService::apply(current, update, user);
        let is_invalid_transition = matches!(
            result,
            Err(SettlementError::InvalidTransition { from, to })
                if from == current && to == update.target()
        );
        prop_assert!(is_invalid_transition);
    }

    /// Nothing ever transitions back to pending.
    #[test]
    fn prop_no_transition_to_pending(current in arb_status()) {
        prop_assert!(!SettlementStatusService::is_valid_transition(current, SettlementStatus::Pending));
    }

    /// `apply` agrees with `is_valid_transition`.
    #[test]
    fn prop_apply_matches_transition_table(
        current in arb_status(),
        update in arb_update(),
        user in arb_user(),
    ) {
        let allowed = SettlementStatusService::is_valid_transition(current, update.target());
        let result = SettlementStatusService::apply(current, update, user);
        prop_assert_eq!(allowed, result.is_ok());
    }
}
