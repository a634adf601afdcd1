// Pago and PagoCuota: a payment received against an invoice and the
// slices of it applied to individual installments.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::money;
use crate::core::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Consignacion,
    Tarjeta,
    Cheque,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Transferencia,
        PaymentMethod::Consignacion,
        PaymentMethod::Tarjeta,
        PaymentMethod::Cheque,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "EFECTIVO",
            PaymentMethod::Transferencia => "TRANSFERENCIA",
            PaymentMethod::Consignacion => "CONSIGNACION",
            PaymentMethod::Tarjeta => "TARJETA",
            PaymentMethod::Cheque => "CHEQUE",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid payment method: {}", s)))
    }
}

/// How a payment is distributed over installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationMode {
    /// Overdue first, then oldest due date first
    #[default]
    Automatica,
    /// Caller-supplied installment amounts
    Manual,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::Automatica => "AUTOMATICA",
            AllocationMode::Manual => "MANUAL",
        }
    }
}

impl std::str::FromStr for AllocationMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AUTOMATICA" => Ok(AllocationMode::Automatica),
            "MANUAL" => Ok(AllocationMode::Manual),
            _ => Err(AppError::validation(format!("Invalid allocation mode: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub allocation_mode: AllocationMode,
    /// Part of `amount` applied to the invoice
    pub allocated_amount: Decimal,
    /// Excess over the outstanding balance, kept on record only
    pub unallocated_amount: Decimal,
    pub paid_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Payment {
    pub fn new(
        invoice_id: String,
        request: &RegisterPaymentRequest,
        allocated_amount: Decimal,
        unallocated_amount: Decimal,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invoice_id,
            amount: request.amount,
            method: request.method,
            reference: request.reference.as_ref().map(|r| r.trim().to_string()),
            allocation_mode: request.mode,
            allocated_amount,
            unallocated_amount,
            paid_at: request.paid_at.unwrap_or(now),
            created_at: now,
        }
    }
}

/// Amount of a payment applied to one installment (PagoCuota)
#[derive(Debug, Clone, Serialize)]
pub struct PaymentApplication {
    pub id: String,
    pub payment_id: String,
    pub installment_id: String,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}

impl PaymentApplication {
    pub fn new(payment_id: &str, installment_id: &str, amount: Decimal, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payment_id: payment_id.to_string(),
            installment_id: installment_id.to_string(),
            amount,
            created_at: now,
        }
    }
}

/// One entry of a manual distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAllocation {
    pub installment_id: String,
    pub amount: Decimal,
}

/// Request body for POST /invoices/{id}/payments (and /preview)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    /// Defaults to the registration time
    pub paid_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub mode: AllocationMode,
    /// Required for MANUAL, rejected for AUTOMATICA
    #[serde(default)]
    pub allocations: Vec<ManualAllocation>,
}

impl RegisterPaymentRequest {
    /// Shape checks that need no database state
    pub fn validate(&self) -> Result<()> {
        money::validate_positive_amount(self.amount, "Payment amount")?;

        if let Some(reference) = &self.reference {
            if reference.len() > 120 {
                return Err(AppError::validation(
                    "Payment reference cannot exceed 120 characters",
                ));
            }
        }

        match self.mode {
            AllocationMode::Automatica if !self.allocations.is_empty() => Err(
                AppError::validation("Allocations are only accepted in MANUAL mode"),
            ),
            AllocationMode::Manual => validate_manual_allocations(&self.allocations),
            AllocationMode::Automatica => Ok(()),
        }
    }
}

fn validate_manual_allocations(allocations: &[ManualAllocation]) -> Result<()> {
    if allocations.is_empty() {
        return Err(AppError::validation(
            "MANUAL mode requires at least one allocation",
        ));
    }

    let mut seen = HashSet::new();
    for allocation in allocations {
        money::validate_positive_amount(allocation.amount, "Allocation amount")?;

        if !seen.insert(allocation.installment_id.as_str()) {
            return Err(AppError::validation(format!(
                "Installment {} appears more than once",
                allocation.installment_id
            )));
        }
    }

    Ok(())
}
