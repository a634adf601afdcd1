// Payment allocation: overdue-first greedy distribution and manual validation

use chrono::NaiveDate;
use erp_juridico::modules::payments::models::ManualAllocation;
use erp_juridico::modules::payments::services::{
    allocate_automatic, allocate_cash, allocate_manual, OutstandingInstallment,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn installment(number: i32, due_date: NaiveDate, remaining: Decimal) -> OutstandingInstallment {
    OutstandingInstallment {
        id: format!("cuota-{}", number),
        installment_number: number,
        due_date,
        remaining,
    }
}

fn manual(id: &str, amount: Decimal) -> ManualAllocation {
    ManualAllocation {
        installment_id: id.to_string(),
        amount,
    }
}

#[test]
fn test_automatic_allocation_fills_oldest_first() {
    let installments = vec![
        installment(1, date(7, 1), dec!(300000)),
        installment(2, date(8, 1), dec!(300000)),
        installment(3, date(9, 1), dec!(400000)),
    ];

    let plan = allocate_automatic(dec!(500000), &installments, date(6, 15)).unwrap();

    assert_eq!(plan.allocations.len(), 2);
    assert_eq!(plan.allocations[0].installment_number, 1);
    assert_eq!(plan.allocations[0].amount, dec!(300000));
    assert_eq!(plan.allocations[0].remaining_after, Decimal::ZERO);
    assert_eq!(plan.allocations[1].installment_number, 2);
    assert_eq!(plan.allocations[1].amount, dec!(200000));
    assert_eq!(plan.allocations[1].remaining_after, dec!(100000));
    assert_eq!(plan.allocated, dec!(500000));
    assert_eq!(plan.unallocated, Decimal::ZERO);
}

#[test]
fn test_automatic_allocation_all_overdue() {
    let installments = vec![
        installment(1, date(3, 1), dec!(300000)),
        installment(2, date(4, 1), dec!(300000)),
        installment(3, date(5, 1), dec!(400000)),
    ];

    // Every installment is past due on Jun 15
    let plan = allocate_automatic(dec!(500000), &installments, date(6, 15)).unwrap();

    let applied: Vec<(i32, Decimal)> = plan
        .allocations
        .iter()
        .map(|a| (a.installment_number, a.amount))
        .collect();
    assert_eq!(applied, vec![(1, dec!(300000)), (2, dec!(200000))]);
    assert_eq!(plan.allocated, dec!(500000));
    assert_eq!(plan.unallocated, Decimal::ZERO);
}

#[test]
fn test_automatic_allocation_overdue_before_lower_number() {
    // Installment 3 was rescheduled to an earlier date and is already overdue
    let installments = vec![
        installment(1, date(9, 1), dec!(100000)),
        installment(2, date(10, 1), dec!(100000)),
        installment(3, date(7, 1), dec!(100000)),
    ];

    let plan = allocate_automatic(dec!(150000), &installments, date(8, 1)).unwrap();

    let numbers: Vec<i32> = plan.allocations.iter().map(|a| a.installment_number).collect();
    assert_eq!(numbers, vec![3, 1]);
    assert_eq!(plan.allocations[0].amount, dec!(100000));
    assert_eq!(plan.allocations[1].amount, dec!(50000));
}

#[test]
fn test_automatic_allocation_ignores_input_order() {
    let installments = vec![
        installment(3, date(9, 1), dec!(400000)),
        installment(1, date(7, 1), dec!(300000)),
        installment(2, date(8, 1), dec!(300000)),
    ];

    // Installments 1 and 2 are overdue on Aug 20
    let plan = allocate_automatic(dec!(650000), &installments, date(8, 20)).unwrap();

    let numbers: Vec<i32> = plan.allocations.iter().map(|a| a.installment_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(plan.allocations[2].amount, dec!(50000));
}

#[test]
fn test_automatic_allocation_skips_paid_installments() {
    let installments = vec![
        installment(1, date(7, 1), Decimal::ZERO),
        installment(2, date(8, 1), dec!(120000.50)),
    ];

    let plan = allocate_automatic(dec!(1000), &installments, date(8, 20)).unwrap();

    assert_eq!(plan.allocations.len(), 1);
    assert_eq!(plan.allocations[0].installment_number, 2);
}

#[test]
fn test_excess_is_reported_as_unallocated() {
    let installments = vec![installment(1, date(7, 1), dec!(100000))];

    let plan = allocate_automatic(dec!(150000), &installments, date(6, 1)).unwrap();

    assert_eq!(plan.allocated, dec!(100000));
    assert_eq!(plan.unallocated, dec!(50000));
}

#[test]
fn test_manual_allocation_within_tolerance() {
    let installments = vec![
        installment(1, date(7, 1), dec!(300000)),
        installment(2, date(8, 1), dec!(300000)),
    ];

    let plan = allocate_manual(
        dec!(250000.01),
        &installments,
        &[manual("cuota-2", dec!(200000)), manual("cuota-1", dec!(50000))],
    )
    .unwrap();

    assert_eq!(plan.allocated, dec!(250000));
    assert_eq!(plan.unallocated, dec!(0.01));
    assert_eq!(plan.allocated + plan.unallocated, dec!(250000.01));
    assert_eq!(plan.allocations[0].installment_number, 2);
}

#[test]
fn test_manual_allocation_exact_leaves_nothing_unallocated() {
    let installments = vec![installment(1, date(7, 1), dec!(300000))];

    let plan = allocate_manual(dec!(120000), &installments, &[manual("cuota-1", dec!(120000))]).unwrap();

    assert_eq!(plan.allocated, dec!(120000));
    assert_eq!(plan.unallocated, Decimal::ZERO);
}

#[test]
fn test_manual_allocation_sum_mismatch_is_rejected() {
    let installments = vec![installment(1, date(7, 1), dec!(300000))];

    let err = allocate_manual(dec!(100000), &installments, &[manual("cuota-1", dec!(99999.98))])
        .unwrap_err();

    assert!(err.to_string().contains("add up to"));
}

#[test]
fn test_manual_allocation_rejections() {
    let installments = vec![
        installment(1, date(7, 1), dec!(300000)),
        installment(2, date(8, 1), dec!(300000)),
    ];

    // Unknown installment
    assert!(allocate_manual(dec!(1000), &installments, &[manual("otra", dec!(1000))]).is_err());

    // Over the remaining balance
    assert!(allocate_manual(dec!(300001), &installments, &[manual("cuota-1", dec!(300001))]).is_err());

    // Listed twice
    assert!(allocate_manual(
        dec!(2000),
        &installments,
        &[manual("cuota-1", dec!(1000)), manual("cuota-1", dec!(1000))],
    )
    .is_err());

    // Empty distribution
    assert!(allocate_manual(dec!(1000), &installments, &[]).is_err());
}

#[test]
fn test_cash_allocation_caps_at_balance() {
    let plan = allocate_cash(dec!(800000), dec!(500000)).unwrap();
    assert_eq!(plan.allocated, dec!(500000));
    assert_eq!(plan.unallocated, dec!(300000));
    assert!(plan.allocations.is_empty());

    assert!(allocate_cash(Decimal::ZERO, dec!(500000)).is_err());
}

fn outstanding_strategy() -> impl Strategy<Value = Vec<OutstandingInstallment>> {
    prop::collection::vec((0i64..100_000_000i64, 0i64..120), 1..12).prop_map(|items| {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        items
            .into_iter()
            .enumerate()
            .map(|(i, (cents, offset))| OutstandingInstallment {
                id: format!("cuota-{}", i + 1),
                installment_number: i as i32 + 1,
                due_date: base + chrono::Duration::days(offset),
                remaining: Decimal::new(cents, 2),
            })
            .collect()
    })
}

proptest! {
    /// Allocated plus unallocated is the payment; allocated never exceeds what is owed
    #[test]
    fn prop_automatic_conserves_amount(
        installments in outstanding_strategy(),
        cents in 1i64..2_000_000_000i64,
        today_offset in 0i64..150,
    ) {
        let amount = Decimal::new(cents, 2);
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(today_offset);
        let owed: Decimal = installments.iter().map(|i| i.remaining).sum();

        let plan = allocate_automatic(amount, &installments, today).unwrap();

        let applied: Decimal = plan.allocations.iter().map(|a| a.amount).sum();
        prop_assert_eq!(applied, plan.allocated);
        prop_assert_eq!(plan.allocated + plan.unallocated, amount);
        prop_assert_eq!(plan.allocated, amount.min(owed));
    }

    /// No installment receives more than it owes, and at most one is left partial
    #[test]
    fn prop_automatic_never_over_applies(
        installments in outstanding_strategy(),
        cents in 1i64..2_000_000_000i64,
    ) {
        let amount = Decimal::new(cents, 2);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let plan = allocate_automatic(amount, &installments, today).unwrap();

        for allocation in &plan.allocations {
            let source = installments
                .iter()
                .find(|i| i.id == allocation.installment_id)
                .unwrap();
            prop_assert!(allocation.amount > Decimal::ZERO);
            prop_assert!(allocation.amount <= source.remaining);
            prop_assert_eq!(allocation.remaining_after, source.remaining - allocation.amount);
        }

        let partial = plan
            .allocations
            .iter()
            .filter(|a| a.remaining_after > Decimal::ZERO)
            .count();
        prop_assert!(partial <= 1);
    }
}
