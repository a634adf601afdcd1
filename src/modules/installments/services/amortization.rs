use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::core::money::{self, round_money};
use crate::core::{AppError, Result};
use crate::modules::installments::models::{FinancingTerms, Installment};

/// One period of a French amortization table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizationRow {
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub principal: Decimal,
    pub interest: Decimal,
    pub amount: Decimal,
    /// Principal still owed after this period
    pub remaining_principal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmortizationSchedule {
    /// Constant installment value (rounded)
    pub installment_value: Decimal,
    pub total_interest: Decimal,
    pub total_amount: Decimal,
    pub rows: Vec<AmortizationRow>,
}

/// French-system amortization (constant installment)
pub struct AmortizationCalculator;

impl AmortizationCalculator {
    /// Constant installment value, unrounded
    ///
    /// `principal * r * (1+r)^n / ((1+r)^n - 1)`, or `principal / n` when r = 0.
    pub fn installment_payment(principal: Decimal, count: u32, rate: Decimal) -> Result<Decimal> {
        if principal <= Decimal::ZERO {
            return Err(AppError::validation("Principal must be positive"));
        }
        if count == 0 {
            return Err(AppError::validation("Installment count cannot be zero"));
        }
        if rate < Decimal::ZERO {
            return Err(AppError::validation("Interest rate cannot be negative"));
        }

        if rate.is_zero() {
            return Ok(principal / Decimal::from(count));
        }

        let factor = Self::compound_factor(rate, count)?;
        let numerator = principal
            .checked_mul(rate)
            .and_then(|v| v.checked_mul(factor))
            .ok_or_else(|| AppError::validation("Amortization overflow"))?;

        numerator
            .checked_div(factor - Decimal::ONE)
            .ok_or_else(|| AppError::validation("Amortization overflow"))
    }

    /// (1 + rate)^count
    fn compound_factor(rate: Decimal, count: u32) -> Result<Decimal> {
        let base = Decimal::ONE + rate;
        let mut factor = Decimal::ONE;
        for _ in 0..count {
            factor = factor
                .checked_mul(base)
                .ok_or_else(|| AppError::validation("Amortization overflow"))?;
        }
        Ok(factor)
    }

    /// Full amortization table with monthly due dates
    ///
    /// The last row takes the exact remaining principal, so principals always
    /// sum to the financed principal.
    pub fn schedule(
        principal: Decimal,
        terms: &FinancingTerms,
    ) -> Result<AmortizationSchedule> {
        terms.validate()?;
        money::validate_positive_amount(principal, "Principal")?;

        let count = terms.installment_count as u32;
        let rate = terms.monthly_interest_rate;
        let installment_value = round_money(Self::installment_payment(principal, count, rate)?);

        let mut rows = Vec::with_capacity(count as usize);
        let mut remaining = principal;

        for i in 0..count {
            let number = (i + 1) as i32;
            let interest = round_money(remaining * rate);

            let principal_part = if i == count - 1 {
                remaining
            } else {
                (installment_value - interest).min(remaining)
            };

            if principal_part <= Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Installment {} would not amortize any principal",
                    number
                )));
            }

            remaining -= principal_part;

            let due_date = terms
                .first_due_date
                .checked_add_months(Months::new(i))
                .ok_or_else(|| AppError::validation("Failed to calculate due date"))?;

            rows.push(AmortizationRow {
                installment_number: number,
                due_date,
                principal: principal_part,
                interest,
                amount: principal_part + interest,
                remaining_principal: remaining,
            });
        }

        let total_interest: Decimal = rows.iter().map(|r| r.interest).sum();
        let total_amount: Decimal = rows.iter().map(|r| r.amount).sum();

        debug!(
            principal = %principal,
            count,
            rate = %rate,
            installment_value = %installment_value,
            total_interest = %total_interest,
            "Amortization schedule calculated"
        );

        Ok(AmortizationSchedule {
            installment_value,
            total_interest,
            total_amount,
            rows,
        })
    }

    /// Turn an amortization table into unpaid installments of an invoice
    pub fn to_installments(
        invoice_id: &str,
        schedule: &AmortizationSchedule,
    ) -> Result<Vec<Installment>> {
        schedule
            .rows
            .iter()
            .map(|row| {
                Installment::new(
                    invoice_id.to_string(),
                    row.installment_number,
                    row.principal,
                    row.interest,
                    row.due_date,
                )
            })
            .collect()
    }
}
