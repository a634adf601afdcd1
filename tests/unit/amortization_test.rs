// French amortization: schedule totals, rounding absorption and due dates

use chrono::NaiveDate;
use erp_juridico::modules::installments::models::FinancingTerms;
use erp_juridico::modules::installments::services::AmortizationCalculator;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn terms(count: i32, rate: Decimal, first_due_date: NaiveDate) -> FinancingTerms {
    FinancingTerms {
        installment_count: count,
        monthly_interest_rate: rate,
        first_due_date,
    }
}

#[test]
fn test_reference_schedule_two_percent_twelve_months() {
    let first = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
    let schedule =
        AmortizationCalculator::schedule(dec!(1000000), &terms(12, dec!(0.02), first)).unwrap();

    assert_eq!(schedule.installment_value, dec!(94559.60));
    assert_eq!(schedule.rows.len(), 12);

    // First period: interest on the full principal
    assert_eq!(schedule.rows[0].interest, dec!(20000.00));
    assert_eq!(schedule.rows[0].principal, dec!(74559.60));

    let principal_sum: Decimal = schedule.rows.iter().map(|r| r.principal).sum();
    assert_eq!(principal_sum, dec!(1000000));
    assert_eq!(schedule.rows[11].remaining_principal, Decimal::ZERO);
    assert_eq!(
        schedule.total_amount,
        dec!(1000000) + schedule.total_interest
    );
}

#[test]
fn test_zero_rate_splits_principal_evenly() {
    let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let schedule =
        AmortizationCalculator::schedule(dec!(12000000), &terms(12, Decimal::ZERO, first)).unwrap();

    assert_eq!(schedule.installment_value, dec!(1000000));
    assert_eq!(schedule.total_interest, Decimal::ZERO);
    assert!(schedule.rows.iter().all(|r| r.amount == dec!(1000000)));
}

#[test]
fn test_last_installment_absorbs_rounding() {
    let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let schedule =
        AmortizationCalculator::schedule(dec!(100), &terms(3, Decimal::ZERO, first)).unwrap();

    let amounts: Vec<Decimal> = schedule.rows.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
}

#[test]
fn test_due_dates_clamp_to_month_end() {
    let first = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let schedule =
        AmortizationCalculator::schedule(dec!(900000), &terms(3, dec!(0.01), first)).unwrap();

    let dates: Vec<NaiveDate> = schedule.rows.iter().map(|r| r.due_date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        ]
    );
}

#[test]
fn test_invalid_terms_are_rejected() {
    let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    assert!(AmortizationCalculator::schedule(dec!(1000), &terms(1, Decimal::ZERO, first)).is_err());
    assert!(AmortizationCalculator::schedule(dec!(1000), &terms(61, Decimal::ZERO, first)).is_err());
    assert!(AmortizationCalculator::schedule(dec!(1000), &terms(6, dec!(-0.01), first)).is_err());
    assert!(AmortizationCalculator::schedule(dec!(1000), &terms(6, dec!(1), first)).is_err());
    assert!(AmortizationCalculator::schedule(dec!(0), &terms(6, Decimal::ZERO, first)).is_err());
}

#[test]
fn test_installment_payment_formula() {
    let payment = AmortizationCalculator::installment_payment(dec!(1000000), 12, dec!(0.02)).unwrap();
    assert_eq!(payment.round_dp(2), dec!(94559.60));

    let flat = AmortizationCalculator::installment_payment(dec!(600), 6, Decimal::ZERO).unwrap();
    assert_eq!(flat, dec!(100));
}

proptest! {
    /// Principals always add up to the financed principal
    #[test]
    fn prop_principals_sum_exactly(
        cents in 10_000i64..10_000_000_000i64,
        count in 2i32..=60,
        rate_bps in 0i64..=300,
    ) {
        let principal = Decimal::new(cents, 2);
        let rate = Decimal::new(rate_bps, 4);
        let first = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let schedule = AmortizationCalculator::schedule(principal, &terms(count, rate, first)).unwrap();

        let principal_sum: Decimal = schedule.rows.iter().map(|r| r.principal).sum();
        prop_assert_eq!(principal_sum, principal);
        prop_assert_eq!(schedule.rows.len(), count as usize);
        prop_assert!(schedule.rows.iter().all(|r| r.amount == r.principal + r.interest));
        prop_assert!(schedule.rows.iter().all(|r| r.principal > Decimal::ZERO));
        prop_assert!(schedule.rows.iter().all(|r| r.interest >= Decimal::ZERO));
    }

    /// Every row but the last pays the constant installment value
    #[test]
    fn prop_constant_installment_value(
        cents in 10_000i64..1_000_000_000i64,
        count in 2i32..=36,
        rate_bps in 0i64..=250,
    ) {
        let principal = Decimal::new(cents, 2);
        let rate = Decimal::new(rate_bps, 4);
        let first = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let schedule = AmortizationCalculator::schedule(principal, &terms(count, rate, first)).unwrap();

        let (last, rest) = schedule.rows.split_last().unwrap();
        prop_assert!(rest.iter().all(|r| r.amount == schedule.installment_value));
        prop_assert_eq!(last.remaining_principal, Decimal::ZERO);
    }

    /// Discounting the constant payment over the term gives back the principal
    #[test]
    fn prop_payment_present_value_matches_principal(
        cents in 10_000i64..10_000_000_000i64,
        count in 2u32..=60,
        rate_bps in 1i64..10_000i64,
    ) {
        let principal = Decimal::new(cents, 2);
        let rate = Decimal::new(rate_bps, 4);

        let payment = AmortizationCalculator::installment_payment(principal, count, rate).unwrap();

        let mut factor = Decimal::ONE;
        for _ in 0..count {
            factor *= Decimal::ONE + rate;
        }
        let present_value = payment * (factor - Decimal::ONE) / (rate * factor);

        prop_assert!(
            (present_value - principal).abs() <= principal * dec!(0.000000001),
            "payment {} over {} months at {} discounts to {}, principal {}",
            payment, count, rate, present_value, principal
        );
    }

    /// Due dates are strictly increasing, one month apart
    #[test]
    fn prop_due_dates_increase(count in 2i32..=60, day in 1u32..=31) {
        let first = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let schedule = AmortizationCalculator::schedule(dec!(5000000), &terms(count, dec!(0.015), first)).unwrap();

        prop_assert!(schedule.rows.windows(2).all(|w| w[0].due_date < w[1].due_date));
        prop_assert_eq!(schedule.rows[0].due_date, first);
    }
}
