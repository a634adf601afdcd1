// Distribution of a payment over the outstanding installments of an invoice.
//
// Pure functions: callers load (and lock) installments, build a plan here,
// then persist it. A plan never applies more to an installment than its
// remaining balance.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::money::{within_tolerance, TOLERANCE};
use crate::core::{AppError, Result};
use crate::modules::installments::models::Installment;
use crate::modules::payments::models::{AllocationMode, ManualAllocation};

/// What the allocator needs to know about an installment
#[derive(Debug, Clone, PartialEq)]
pub struct OutstandingInstallment {
    pub id: String,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    /// Nominal amount minus what is already applied
    pub remaining: Decimal,
}

impl From<&Installment> for OutstandingInstallment {
    fn from(installment: &Installment) -> Self {
        Self {
            id: installment.id.clone(),
            installment_number: installment.installment_number,
            due_date: installment.due_date,
            remaining: installment.remaining(),
        }
    }
}

/// Amount planned for one installment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub installment_id: String,
    pub installment_number: i32,
    pub amount: Decimal,
    /// Remaining balance of the installment after this allocation
    pub remaining_after: Decimal,
}

/// Outcome of distributing a payment
#[derive(Debug, Clone, Serialize)]
pub struct AllocationPlan {
    pub mode: AllocationMode,
    pub allocations: Vec<Allocation>,
    /// Total applied to the invoice
    pub allocated: Decimal,
    /// Part of the payment not applied to any installment
    pub unallocated: Decimal,
}

/// Overdue first, then by due date, then by installment number
fn priority_order(installments: &[OutstandingInstallment], today: NaiveDate) -> Vec<&OutstandingInstallment> {
    let mut ordered: Vec<&OutstandingInstallment> = installments
        .iter()
        .filter(|i| i.remaining > Decimal::ZERO)
        .collect();

    ordered.sort_by(|a, b| {
        let a_overdue = a.due_date < today;
        let b_overdue = b.due_date < today;
        b_overdue
            .cmp(&a_overdue)
            .then(a.due_date.cmp(&b.due_date))
            .then(a.installment_number.cmp(&b.installment_number))
    });

    ordered
}

/// Greedy chronological allocation
///
/// Each installment in priority order receives `min(left, remaining)`.
/// Whatever is left once every installment is covered is reported as
/// unallocated. Zero-amount allocations are never emitted.
pub fn allocate_automatic(
    amount: Decimal,
    installments: &[OutstandingInstallment],
    today: NaiveDate,
) -> Result<AllocationPlan> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Payment amount must be positive"));
    }

    let mut left = amount;
    let mut allocations = Vec::new();

    for installment in priority_order(installments, today) {
        if left <= Decimal::ZERO {
            break;
        }

        let applied = left.min(installment.remaining);
        left -= applied;

        allocations.push(Allocation {
            installment_id: installment.id.clone(),
            installment_number: installment.installment_number,
            amount: applied,
            remaining_after: installment.remaining - applied,
        });
    }

    Ok(AllocationPlan {
        mode: AllocationMode::Automatica,
        allocated: amount - left,
        unallocated: left,
        allocations,
    })
}

/// Validate and adopt a caller-supplied distribution
///
/// Rejects the whole plan when an installment is unknown, listed twice,
/// over-applied, or when the amounts do not add up to the payment within
/// the money tolerance.
pub fn allocate_manual(
    amount: Decimal,
    installments: &[OutstandingInstallment],
    requested: &[ManualAllocation],
) -> Result<AllocationPlan> {
    if requested.is_empty() {
        return Err(AppError::validation(
            "MANUAL mode requires at least one allocation",
        ));
    }

    let by_id: HashMap<&str, &OutstandingInstallment> =
        installments.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut allocations: Vec<Allocation> = Vec::with_capacity(requested.len());
    for entry in requested {
        if entry.amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Allocation for installment {} must be positive",
                entry.installment_id
            )));
        }

        let installment = by_id.get(entry.installment_id.as_str()).ok_or_else(|| {
            AppError::validation(format!(
                "Installment {} does not belong to this invoice",
                entry.installment_id
            ))
        })?;

        if allocations.iter().any(|a| a.installment_id == entry.installment_id) {
            return Err(AppError::validation(format!(
                "Installment {} appears more than once",
                entry.installment_id
            )));
        }

        if entry.amount > installment.remaining {
            return Err(AppError::validation(format!(
                "Allocation {} exceeds the remaining balance {} of installment {}",
                entry.amount, installment.remaining, installment.installment_number
            )));
        }

        allocations.push(Allocation {
            installment_id: installment.id.clone(),
            installment_number: installment.installment_number,
            amount: entry.amount,
            remaining_after: installment.remaining - entry.amount,
        });
    }

    let allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    if !within_tolerance(allocated, amount) {
        return Err(AppError::validation(format!(
            "Allocations add up to {} but the payment is {} (tolerance {})",
            allocated, amount, TOLERANCE
        )));
    }

    // An under-distribution inside the tolerance stays on the payment row
    Ok(AllocationPlan {
        mode: AllocationMode::Manual,
        allocations,
        allocated,
        unallocated: (amount - allocated).max(Decimal::ZERO),
    })
}

/// Cash invoices have no installments; the payment goes to the balance
pub fn allocate_cash(amount: Decimal, balance: Decimal) -> Result<AllocationPlan> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Payment amount must be positive"));
    }

    let allocated = amount.min(balance.max(Decimal::ZERO));

    Ok(AllocationPlan {
        mode: AllocationMode::Automatica,
        allocations: Vec::new(),
        allocated,
        unallocated: amount - allocated,
    })
}
