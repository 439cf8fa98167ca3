//! Property-based tests for SettlementCalculator.
//!
//! - Zero-sum: paid totals equal should-pay totals
//! - Consistency: the transfer equals each partner's imbalance
//! - Symmetry: swapping partners flips the direction only
//! - Idempotence and order independence
//! - Rounding: every reported amount is a whole yen

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tandem_shared::types::{ExpenseId, UserId, is_whole_unit};
use uuid::Uuid;

use super::calculator::SettlementCalculator;
use super::types::{ExpenseRecord, SettlementPeriod, WhoPaysWhom};

/// The same direction with user1 and user2 swapped.
fn mirror(direction: WhoPaysWhom) -> WhoPaysWhom {
    match direction {
        WhoPaysWhom::User1PaysUser2 => WhoPaysWhom::User2PaysUser1,
        WhoPaysWhom::User2PaysUser1 => WhoPaysWhom::User1PaysUser2,
        WhoPaysWhom::NoTransfer => WhoPaysWhom::NoTransfer,
    }
}

/// Strategy for whole-yen amounts (1 to 1,000,000).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000i64).prop_map(Decimal::from)
}

/// Strategy for split ratios with four decimal places in `[0, 1]`.
fn arb_ratio() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy for a pair of distinct partner ids.
fn arb_partners() -> impl Strategy<Value = (UserId, UserId)> {
    (any::<u128>(), any::<u128>())
        .prop_filter("partners must differ", |(a, b)| a != b)
        .prop_map(|(a, b)| {
            (
                UserId::from(Uuid::from_u128(a)),
                UserId::from(Uuid::from_u128(b)),
            )
        })
}

/// Expense shape: (amount, paid by user1?, split ratio).
fn arb_expense_shapes() -> impl Strategy<Value = Vec<(Decimal, bool, Decimal)>> {
    prop::collection::vec((arb_amount(), any::<bool>(), arb_ratio()), 0..30)
}

fn period() -> SettlementPeriod {
    SettlementPeriod::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

fn build(shapes: &[(Decimal, bool, Decimal)], user1: UserId, user2: UserId) -> Vec<ExpenseRecord> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, (amount, by_user1, ratio))| ExpenseRecord {
            id: ExpenseId::from(Uuid::from_u128(i as u128 + 1)),
            amount: *amount,
            payer_id: if *by_user1 { user1 } else { user2 },
            split_ratio: *ratio,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            settled: false,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Everything paid is somebody's responsibility.
    #[test]
    fn prop_zero_sum(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        prop_assert_eq!(
            result.user1_paid_total + result.user2_paid_total,
            result.user1_should_pay + result.user2_should_pay
        );
        prop_assert_eq!(result.user1_paid_total + result.user2_paid_total, result.total_amount);
    }

    /// The transfer equals both partners' imbalance, and is zero iff there is no direction.
    #[test]
    fn prop_consistency(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        prop_assert_eq!(
            result.settlement_amount,
            (result.user1_paid_total - result.user1_should_pay).abs()
        );
        prop_assert_eq!(
            result.settlement_amount,
            (result.user2_paid_total - result.user2_should_pay).abs()
        );
        prop_assert_eq!(
            result.settlement_amount.is_zero(),
            result.who_pays_whom == WhoPaysWhom::NoTransfer
        );

        let user1_balance = result.user1_paid_total - result.user1_should_pay;
        match result.who_pays_whom {
            WhoPaysWhom::User1PaysUser2 => prop_assert!(user1_balance < Decimal::ZERO),
            WhoPaysWhom::User2PaysUser1 => prop_assert!(user1_balance > Decimal::ZERO),
            WhoPaysWhom::NoTransfer => prop_assert!(user1_balance.is_zero()),
        }
    }

    /// Every reported amount is a whole yen.
    #[test]
    fn prop_amounts_are_whole_yen(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        prop_assert!(is_whole_unit(result.user1_should_pay));
        prop_assert!(is_whole_unit(result.user2_should_pay));
        prop_assert!(is_whole_unit(result.settlement_amount));
        prop_assert!(result.settlement_amount >= Decimal::ZERO);
    }

    /// Swapping partners and complementing ratios keeps the amount and flips the direction.
    #[test]
    fn prop_symmetry(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let swapped: Vec<ExpenseRecord> = expenses
            .iter()
            .map(|e| ExpenseRecord {
                split_ratio: Decimal::ONE - e.split_ratio,
                ..e.clone()
            })
            .collect();

        let original = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();
        let mirrored = SettlementCalculator::calculate(&swapped, u2, u1, period()).unwrap();

        prop_assert_eq!(original.settlement_amount, mirrored.settlement_amount);
        prop_assert_eq!(mirror(original.who_pays_whom), mirrored.who_pays_whom);
        prop_assert_eq!(original.user1_paid_total, mirrored.user2_paid_total);
        prop_assert_eq!(original.user1_should_pay, mirrored.user2_should_pay);
        prop_assert_eq!(original.transfer(), mirrored.transfer());
    }

    /// Identical inputs give identical results.
    #[test]
    fn prop_idempotent(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let first = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();
        let second = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        prop_assert_eq!(first, second);
    }

    /// Permuting the input changes nothing but the id order.
    #[test]
    fn prop_order_independent(shapes in arb_expense_shapes(), (u1, u2) in arb_partners()) {
        let expenses = build(&shapes, u1, u2);
        let mut reversed = expenses.clone();
        reversed.reverse();

        let forward = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();
        let backward = SettlementCalculator::calculate(&reversed, u1, u2, period()).unwrap();

        prop_assert_eq!(forward.user1_paid_total, backward.user1_paid_total);
        prop_assert_eq!(forward.user2_paid_total, backward.user2_paid_total);
        prop_assert_eq!(forward.user1_should_pay, backward.user1_should_pay);
        prop_assert_eq!(forward.user2_should_pay, backward.user2_should_pay);
        prop_assert_eq!(forward.settlement_amount, backward.settlement_amount);
        prop_assert_eq!(forward.who_pays_whom, backward.who_pays_whom);
    }

    /// A ratio outside `[0, 1]` anywhere in the list rejects the calculation.
    #[test]
    fn prop_out_of_range_ratio_rejected(
        shapes in arb_expense_shapes(),
        (u1, u2) in arb_partners(),
        excess in 1i64..10_000i64,
    ) {
        let mut expenses = build(&shapes, u1, u2);
        let mut bad = build(&[(Decimal::from(100), true, Decimal::ONE)], u1, u2).remove(0);
        bad.id = ExpenseId::new();
        bad.split_ratio = Decimal::ONE + Decimal::new(excess, 4);
        let position = expenses.len() / 2;
        expenses.insert(position, bad);

        prop_assert!(SettlementCalculator::calculate(&expenses, u1, u2, period()).is_err());
    }
}
