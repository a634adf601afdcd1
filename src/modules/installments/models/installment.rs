use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Minimum and maximum number of installments for a financed invoice
pub const MIN_INSTALLMENTS: i32 = 2;
pub const MAX_INSTALLMENTS: i32 = 60;

/// Installment (cuota) of a financed invoice
///
/// The schedule fields (number, principal, interest, amount, due date) are
/// fixed at creation. Only the paid projection changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: String,
    pub invoice_id: String,
    /// Sequential number (1, 2, 3...)
    pub installment_number: i32,
    pub principal: Decimal,
    pub interest: Decimal,
    /// Nominal value: principal + interest
    pub amount: Decimal,
    pub due_date: NaiveDate,
    /// Accumulated amount of payment applications
    pub paid_amount: Decimal,
    /// amount - paid_amount
    pub balance: Decimal,
    pub status: InstallmentStatus,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    /// Nothing paid yet
    Pendiente,
    /// Partially covered
    Parcial,
    /// Fully covered
    Pagada,
    /// Due date passed without being fully covered
    Vencida,
}

impl InstallmentStatus {
    pub const ALL: [InstallmentStatus; 4] = [
        InstallmentStatus::Pendiente,
        InstallmentStatus::Parcial,
        InstallmentStatus::Pagada,
        InstallmentStatus::Vencida,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "PENDIENTE",
            Self::Parcial => "PARCIAL",
            Self::Pagada => "PAGADA",
            Self::Vencida => "VENCIDA",
        }
    }

    /// Adjacency table of allowed transitions
    ///
    /// PARCIAL -> PARCIAL is a second partial application.
    pub fn allowed_transitions(&self) -> &'static [InstallmentStatus] {
        use InstallmentStatus::*;
        match self {
            Pendiente => &[Parcial, Pagada, Vencida],
            Parcial => &[Parcial, Pagada, Vencida],
            Vencida => &[Parcial, Pagada],
            Pagada => &[],
        }
    }

    pub fn can_transition_to(&self, next: InstallmentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InstallmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        InstallmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid installment status: {}", s)))
    }
}

impl Installment {
    /// Create a new, unpaid schedule entry
    pub fn new(
        invoice_id: String,
        installment_number: i32,
        principal: Decimal,
        interest: Decimal,
        due_date: NaiveDate,
    ) -> Result<Self> {
        if !(1..=MAX_INSTALLMENTS).contains(&installment_number) {
            return Err(AppError::validation(format!(
                "Installment number must be between 1 and {}, got {}",
                MAX_INSTALLMENTS, installment_number
            )));
        }

        if principal <= Decimal::ZERO {
            return Err(AppError::validation("Installment principal must be positive"));
        }

        if interest < Decimal::ZERO {
            return Err(AppError::validation("Installment interest cannot be negative"));
        }

        let now = Utc::now().naive_utc();
        let amount = principal + interest;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            invoice_id,
            installment_number,
            principal,
            interest,
            amount,
            due_date,
            paid_amount: Decimal::ZERO,
            balance: amount,
            status: InstallmentStatus::Pendiente,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Amount still owed on this installment
    pub fn remaining(&self) -> Decimal {
        (self.amount - self.paid_amount).max(Decimal::ZERO)
    }

    pub fn is_paid(&self) -> bool {
        self.remaining() == Decimal::ZERO
    }

    /// Past its due date and not fully covered
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid() && self.due_date < today
    }

    /// Apply part of a payment to this installment
    ///
    /// Never lets the accumulated paid amount exceed the nominal value.
    pub fn apply_payment(&mut self, amount: Decimal, at: NaiveDateTime) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "Applied amount must be positive",
            ));
        }

        let remaining = self.remaining();
        if amount > remaining {
            return Err(AppError::validation(format!(
                "Cannot apply {} to installment {}: remaining balance is {}",
                amount, self.installment_number, remaining
            )));
        }

        let paid_amount = self.paid_amount + amount;
        let next = if paid_amount == self.amount {
            InstallmentStatus::Pagada
        } else {
            InstallmentStatus::Parcial
        };

        self.transition_to(next)?;
        self.paid_amount = paid_amount;
        self.balance = self.amount - paid_amount;
        if next == InstallmentStatus::Pagada {
            self.paid_at = Some(at);
        }
        self.updated_at = at;

        Ok(())
    }

    /// Mark as VENCIDA when the due date passed unpaid
    ///
    /// Returns whether the status changed.
    pub fn mark_overdue_if_due(&mut self, today: NaiveDate) -> Result<bool> {
        if self.status == InstallmentStatus::Vencida || !self.is_overdue(today) {
            return Ok(false);
        }

        self.transition_to(InstallmentStatus::Vencida)?;
        self.updated_at = Utc::now().naive_utc();
        Ok(true)
    }

    fn transition_to(&mut self, next: InstallmentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Invalid installment status transition from {} to {} (installment {})",
                self.status, next, self.installment_number
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// Terms used to turn an invoice into installments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingTerms {
    pub installment_count: i32,
    /// Monthly rate as a fraction (0.015 = 1.5 %)
    #[serde(default)]
    pub monthly_interest_rate: Decimal,
    pub first_due_date: NaiveDate,
}

impl FinancingTerms {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&self.installment_count) {
            return Err(AppError::validation(format!(
                "Installment count must be between {} and {}, got {}",
                MIN_INSTALLMENTS, MAX_INSTALLMENTS, self.installment_count
            )));
        }

        if self.monthly_interest_rate < Decimal::ZERO || self.monthly_interest_rate >= Decimal::ONE
        {
            return Err(AppError::validation(format!(
                "Monthly interest rate must be in [0, 1), got {}",
                self.monthly_interest_rate
            )));
        }

        Ok(())
    }
}
