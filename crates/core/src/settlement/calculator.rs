//! Settlement calculator.
//!
//! Computes what each partner paid, what each partner was responsible for,
//! and the single transfer that evens the two out. The calculator is pure:
//! it reads nothing but its arguments and has no side effects.

use rust_decimal::Decimal;
use tandem_shared::types::{UserId, is_whole_unit, round_to_unit};

use super::error::SettlementError;
use super::types::{ExpenseRecord, SettlementPeriod, SettlementResult, WhoPaysWhom};

/// Running totals for a set of expenses, before rounding.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    user1_paid: Decimal,
    user2_paid: Decimal,
    user1_responsibility: Decimal,
    total: Decimal,
}

/// Stateless settlement calculator.
pub struct SettlementCalculator;

impl SettlementCalculator {
    /// Calculate the settlement for a set of unsettled expenses.
    ///
    /// Every precondition is checked before anything is summed, so a bad
    /// record anywhere in the list rejects the whole calculation.
    ///
    /// The signed balance `user1_paid - user1_responsibility` is accumulated
    /// exactly and rounded once, half away from zero, to whole yen. The
    /// direction comes from the rounded balance and the should-pay totals
    /// are reported as `paid - rounded balance`, so:
    ///
    /// - `user1_paid + user2_paid == user1_should_pay + user2_should_pay`
    /// - `settlement_amount == |user1_paid - user1_should_pay|`
    /// - `settlement_amount == 0` iff the direction is `NoTransfer`
    ///
    /// # Errors
    ///
    /// - `SamePartner` if `user1_id == user2_id`
    /// - `UnknownPayer` if an expense was paid by someone else
    /// - `SplitRatioOutOfRange` if a ratio is outside `[0, 1]`
    /// - `NonPositiveAmount` / `FractionalAmount` for bad amounts
    /// - `AmountOverflow` if totals leave the decimal range
    pub fn calculate(
        expenses: &[ExpenseRecord],
        user1_id: UserId,
        user2_id: UserId,
        period: SettlementPeriod,
    ) -> Result<SettlementResult, SettlementError> {
        if user1_id == user2_id {
            return Err(SettlementError::SamePartner);
        }

        for expense in expenses {
            Self::validate_record(expense, user1_id, user2_id)?;
        }

        let totals = Self::accumulate(expenses, user1_id)?;

        let balance = round_to_unit(
            totals
                .user1_paid
                .checked_sub(totals.user1_responsibility)
                .ok_or(SettlementError::AmountOverflow)?,
        );

        let who_pays_whom = if balance > Decimal::ZERO {
            WhoPaysWhom::User2PaysUser1
        } else if balance < Decimal::ZERO {
            WhoPaysWhom::User1PaysUser2
        } else {
            WhoPaysWhom::NoTransfer
        };

        let user1_should_pay = totals
            .user1_paid
            .checked_sub(balance)
            .ok_or(SettlementError::AmountOverflow)?;
        let user2_should_pay = totals
            .total
            .checked_sub(user1_should_pay)
            .ok_or(SettlementError::AmountOverflow)?;

        Ok(SettlementResult {
            period_start: period.start(),
            period_end: period.end(),
            user1_id,
            user2_id,
            user1_paid_total: totals.user1_paid.normalize(),
            user2_paid_total: totals.user2_paid.normalize(),
            user1_should_pay: user1_should_pay.normalize(),
            user2_should_pay: user2_should_pay.normalize(),
            total_amount: totals.total.normalize(),
            settlement_amount: balance.abs().normalize(),
            who_pays_whom,
            expense_ids: expenses.iter().map(|e| e.id).collect(),
        })
    }

    /// Check a single record against the calculator's preconditions.
    fn validate_record(
        expense: &ExpenseRecord,
        user1_id: UserId,
        user2_id: UserId,
    ) -> Result<(), SettlementError> {
        if expense.payer_id != user1_id && expense.payer_id != user2_id {
            return Err(SettlementError::UnknownPayer {
                expense_id: expense.id,
                payer_id: expense.payer_id,
            });
        }

        if expense.split_ratio < Decimal::ZERO || expense.split_ratio > Decimal::ONE {
            return Err(SettlementError::SplitRatioOutOfRange {
                expense_id: expense.id,
                split_ratio: expense.split_ratio,
            });
        }

        if expense.amount <= Decimal::ZERO {
            return Err(SettlementError::NonPositiveAmount {
                expense_id: expense.id,
                amount: expense.amount,
            });
        }

        if !is_whole_unit(expense.amount) {
            return Err(SettlementError::FractionalAmount {
                expense_id: expense.id,
                amount: expense.amount,
            });
        }

        Ok(())
    }

    fn accumulate(expenses: &[ExpenseRecord], user1_id: UserId) -> Result<Totals, SettlementError> {
        expenses.iter().try_fold(Totals::default(), |mut acc, e| {
            let paid = if e.payer_id == user1_id {
                &mut acc.user1_paid
            } else {
                &mut acc.user2_paid
            };
            *paid = paid
                .checked_add(e.amount)
                .ok_or(SettlementError::AmountOverflow)?;

            let share = e
                .amount
                .checked_mul(e.split_ratio)
                .ok_or(SettlementError::AmountOverflow)?;
            acc.user1_responsibility = acc
                .user1_responsibility
                .checked_add(share)
                .ok_or(SettlementError::AmountOverflow)?;

            acc.total = acc
                .total
                .checked_add(e.amount)
                .ok_or(SettlementError::AmountOverflow)?;

            Ok(acc)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tandem_shared::types::ExpenseId;

    fn period() -> SettlementPeriod {
        SettlementPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    fn expense(amount: Decimal, payer_id: UserId, split_ratio: Decimal) -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseId::new(),
            amount,
            payer_id,
            split_ratio,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            settled: false,
        }
    }

    #[test]
    fn test_user1_pays_user2() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![
            expense(dec!(1000), u1, dec!(0.5)),
            expense(dec!(2000), u2, dec!(0.5)),
        ];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.user1_paid_total, dec!(1000));
        assert_eq!(result.user2_paid_total, dec!(2000));
        assert_eq!(result.user1_should_pay, dec!(1500));
        assert_eq!(result.user2_should_pay, dec!(1500));
        assert_eq!(result.total_amount, dec!(3000));
        assert_eq!(result.settlement_amount, dec!(500));
        assert_eq!(result.who_pays_whom, WhoPaysWhom::User1PaysUser2);
        assert_eq!(result.expense_ids, vec![expenses[0].id, expenses[1].id]);
        assert_eq!(result.transfer().unwrap().from, u1);
    }

    #[test]
    fn test_even_split_needs_no_transfer() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![
            expense(dec!(1000), u1, dec!(0.5)),
            expense(dec!(1000), u2, dec!(0.5)),
        ];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.settlement_amount, Decimal::ZERO);
        assert_eq!(result.who_pays_whom, WhoPaysWhom::NoTransfer);
        assert!(!result.requires_settlement());
    }

    #[test]
    fn test_empty_input() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let result = SettlementCalculator::calculate(&[], u1, u2, period()).unwrap();

        assert_eq!(result.settlement_amount, Decimal::ZERO);
        assert_eq!(result.total_amount, Decimal::ZERO);
        assert_eq!(result.who_pays_whom, WhoPaysWhom::NoTransfer);
        assert!(result.expense_ids.is_empty());
    }

    #[test]
    fn test_uneven_ratio_user2_pays_user1() {
        let (u1, u2) = (UserId::new(), UserId::new());
        // User1 paid everything but is only responsible for 30%.
        let expenses = vec![expense(dec!(10000), u1, dec!(0.3))];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.user1_should_pay, dec!(3000));
        assert_eq!(result.user2_should_pay, dec!(7000));
        assert_eq!(result.settlement_amount, dec!(7000));
        assert_eq!(result.who_pays_whom, WhoPaysWhom::User2PaysUser1);
    }

    #[test]
    fn test_fractional_balance_rounds_half_up() {
        let (u1, u2) = (UserId::new(), UserId::new());
        // User1 paid 1001 and owes half of it, leaving a balance of 500.5.
        let expenses = vec![expense(dec!(1001), u1, dec!(0.5))];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.settlement_amount, dec!(501));
        assert_eq!(result.who_pays_whom, WhoPaysWhom::User2PaysUser1);
        assert_eq!(result.user1_should_pay, dec!(500));
        assert_eq!(result.user2_should_pay, dec!(501));
        assert_eq!(
            result.user1_paid_total + result.user2_paid_total,
            result.user1_should_pay + result.user2_should_pay
        );
    }

    #[test]
    fn test_sub_unit_balance_is_no_transfer() {
        let (u1, u2) = (UserId::new(), UserId::new());
        // User1 is responsible for 999.9, leaving a balance of 0.1.
        let expenses = vec![
            expense(dec!(1000), u1, dec!(0.5)),
            expense(dec!(1000), u2, dec!(0.4999)),
        ];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.settlement_amount, Decimal::ZERO);
        assert_eq!(result.who_pays_whom, WhoPaysWhom::NoTransfer);
        assert_eq!(result.user1_should_pay, result.user1_paid_total);
    }

    #[test]
    fn test_full_ratio_extremes() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![
            expense(dec!(500), u2, dec!(1)),
            expense(dec!(300), u1, dec!(0)),
        ];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();

        assert_eq!(result.user1_should_pay, dec!(500));
        assert_eq!(result.user2_should_pay, dec!(300));
        assert_eq!(result.settlement_amount, dec!(200));
        assert_eq!(result.who_pays_whom, WhoPaysWhom::User1PaysUser2);
    }

    #[test]
    fn test_rejects_same_partner() {
        let u1 = UserId::new();
        let result = SettlementCalculator::calculate(&[], u1, u1, period());
        assert!(matches!(result, Err(SettlementError::SamePartner)));
    }

    #[test]
    fn test_rejects_unknown_payer() {
        let (u1, u2, stranger) = (UserId::new(), UserId::new(), UserId::new());
        let expenses = vec![
            expense(dec!(1000), u1, dec!(0.5)),
            expense(dec!(1000), stranger, dec!(0.5)),
        ];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period());
        match result {
            Err(SettlementError::UnknownPayer {
                expense_id,
                payer_id,
            }) => {
                assert_eq!(expense_id, expenses[1].id);
                assert_eq!(payer_id, stranger);
            }
            other => panic!("expected UnknownPayer, got {other:?}"),
        }
    }

    #[rstest]
    #[case(dec!(-0.01))]
    #[case(dec!(1.0001))]
    #[case(dec!(2))]
    fn test_rejects_split_ratio_out_of_range(#[case] ratio: Decimal) {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![expense(dec!(1000), u1, ratio)];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period());
        assert!(matches!(
            result,
            Err(SettlementError::SplitRatioOutOfRange { .. })
        ));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-100))]
    fn test_rejects_non_positive_amount(#[case] amount: Decimal) {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![expense(amount, u1, dec!(0.5))];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period());
        assert!(matches!(
            result,
            Err(SettlementError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn test_rejects_fractional_amount() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![expense(dec!(100.5), u1, dec!(0.5))];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period());
        assert!(matches!(
            result,
            Err(SettlementError::FractionalAmount { .. })
        ));
    }

    #[test]
    fn test_one_bad_record_rejects_everything() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let mut expenses: Vec<_> = (0..10)
            .map(|_| expense(dec!(1000), u1, dec!(0.5)))
            .collect();
        expenses.push(expense(dec!(1000), u2, dec!(1.5)));

        assert!(SettlementCalculator::calculate(&expenses, u1, u2, period()).is_err());
    }

    #[test]
    fn test_trailing_zero_amounts_normalize() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let expenses = vec![expense(dec!(1000.00), u1, dec!(0.5000))];

        let result = SettlementCalculator::calculate(&expenses, u1, u2, period()).unwrap();
        assert_eq!(result.user1_should_pay.to_string(), "500");
        assert_eq!(result.settlement_amount.to_string(), "500");
    }
}
