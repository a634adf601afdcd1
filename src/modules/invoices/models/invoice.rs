// Factura: a legal-fee invoice, paid cash (contado) or financed in
// installments (financiado). paid_amount and balance are cached projections
// of the payments applied to it.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::money::{self, TOLERANCE};
use crate::core::{AppError, Result};
use crate::modules::installments::models::Installment;

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Issued, not yet sent to the client
    Generada,
    /// Sent to the client
    Enviada,
    /// Fully paid
    Pagada,
    /// Due date passed with a pending balance
    Vencida,
    /// Cancelled (terminal)
    Anulada,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Generada,
        InvoiceStatus::Enviada,
        InvoiceStatus::Pagada,
        InvoiceStatus::Vencida,
        InvoiceStatus::Anulada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Generada => "GENERADA",
            InvoiceStatus::Enviada => "ENVIADA",
            InvoiceStatus::Pagada => "PAGADA",
            InvoiceStatus::Vencida => "VENCIDA",
            InvoiceStatus::Anulada => "ANULADA",
        }
    }

    /// Adjacency table of allowed transitions
    pub fn allowed_transitions(&self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;
        match self {
            Generada => &[Enviada, Pagada, Vencida, Anulada],
            Enviada => &[Pagada, Vencida, Anulada],
            Vencida => &[Pagada, Anulada],
            Pagada => &[],
            Anulada => &[],
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Statuses under which new payments are accepted
    pub fn accepts_payments(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Generada | InvoiceStatus::Enviada | InvoiceStatus::Vencida
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid invoice status: {}", s)))
    }
}

/// Cash or financed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentModality {
    Contado,
    Financiado,
}

impl PaymentModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentModality::Contado => "CONTADO",
            PaymentModality::Financiado => "FINANCIADO",
        }
    }
}

impl std::fmt::Display for PaymentModality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentModality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CONTADO" => Ok(PaymentModality::Contado),
            "FINANCIADO" => Ok(PaymentModality::Financiado),
            _ => Err(AppError::validation(format!("Invalid payment modality: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub case_id: Option<String>,
    pub client_name: String,
    pub client_document: String,
    pub concept: String,
    pub total: Decimal,
    pub modality: PaymentModality,
    pub installment_count: Option<i32>,
    /// Monthly rate as a fraction (0.015 = 1.5 %)
    pub interest_rate: Decimal,
    pub installment_value: Option<Decimal>,
    /// total for cash invoices, sum of installment amounts once financed
    pub amount_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Request body for POST /invoices
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub client_name: String,
    pub client_document: String,
    pub concept: String,
    pub total: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub case_id: Option<String>,
}

impl Invoice {
    /// Create a new cash invoice in GENERADA
    pub fn new(request: CreateInvoiceRequest, today: NaiveDate) -> Result<Self> {
        Self::validate_party(&request.client_name, &request.client_document)?;

        if request.concept.trim().is_empty() {
            return Err(AppError::validation("Concept cannot be empty"));
        }
        if request.concept.len() > 500 {
            return Err(AppError::validation("Concept cannot exceed 500 characters"));
        }

        money::validate_positive_amount(request.total, "Invoice total")?;

        let issue_date = request.issue_date.unwrap_or(today);
        if request.due_date < issue_date {
            return Err(AppError::validation(format!(
                "Due date {} cannot be before issue date {}",
                request.due_date, issue_date
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let total = money::round_money(request.total);

        Ok(Self {
            id: id.to_string(),
            invoice_number: Self::number_for(issue_date, &id),
            case_id: request.case_id,
            client_name: request.client_name.trim().to_string(),
            client_document: request.client_document.trim().to_string(),
            concept: request.concept.trim().to_string(),
            total,
            modality: PaymentModality::Contado,
            installment_count: None,
            interest_rate: Decimal::ZERO,
            installment_value: None,
            amount_due: total,
            paid_amount: Decimal::ZERO,
            balance: total,
            status: InvoiceStatus::Generada,
            issue_date,
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
        })
    }

    // FAC-20250301-1A2B3C4D
    fn number_for(issue_date: NaiveDate, id: &Uuid) -> String {
        let suffix: String = id.simple().to_string().chars().take(8).collect();
        format!(
            "FAC-{}-{}",
            issue_date.format("%Y%m%d"),
            suffix.to_uppercase()
        )
    }

    fn validate_party(client_name: &str, client_document: &str) -> Result<()> {
        if client_name.trim().is_empty() {
            return Err(AppError::validation("Client name cannot be empty"));
        }
        if client_name.len() > 200 {
            return Err(AppError::validation(
                "Client name cannot exceed 200 characters",
            ));
        }
        if client_document.trim().is_empty() {
            return Err(AppError::validation("Client document cannot be empty"));
        }
        Ok(())
    }

    pub fn is_financed(&self) -> bool {
        self.modality == PaymentModality::Financiado
    }

    /// Balance is settled once it is within the money tolerance
    pub fn is_settled(&self) -> bool {
        self.balance <= TOLERANCE
    }

    /// Move to a new status through the adjacency table
    pub fn transition_to(&mut self, next: InvoiceStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Invalid invoice status transition from {} to {}",
                self.status, next
            )));
        }

        if next == InvoiceStatus::Anulada && self.paid_amount > Decimal::ZERO {
            return Err(AppError::validation(
                "Cannot annul an invoice that already has payments",
            ));
        }

        if next == InvoiceStatus::Pagada && !self.is_settled() {
            return Err(AppError::validation(format!(
                "Cannot mark invoice as paid with a pending balance of {}",
                self.balance
            )));
        }

        self.status = next;
        self.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    /// Check the invoice can still be turned into a financed invoice
    pub fn ensure_financeable(&self) -> Result<()> {
        if self.is_financed() {
            return Err(AppError::validation(
                "Invoice is already financed; installments cannot be regenerated",
            ));
        }
        if !matches!(self.status, InvoiceStatus::Generada | InvoiceStatus::Enviada) {
            return Err(AppError::validation(format!(
                "Only GENERADA or ENVIADA invoices can be financed (status: {})",
                self.status
            )));
        }
        if self.paid_amount > Decimal::ZERO {
            return Err(AppError::validation(
                "Cannot finance an invoice that already has payments",
            ));
        }
        Ok(())
    }

    /// Switch to FINANCIADO with the generated schedule
    ///
    /// amount_due becomes the sum of installment amounts (principal plus
    /// interest); the invoice due date moves to the last installment.
    pub fn apply_financing(
        &mut self,
        interest_rate: Decimal,
        installment_value: Decimal,
        schedule: &[Installment],
    ) -> Result<()> {
        self.ensure_financeable()?;

        let last = schedule
            .iter()
            .max_by_key(|i| i.installment_number)
            .ok_or_else(|| AppError::validation("Installment schedule cannot be empty"))?;

        let amount_due: Decimal = schedule.iter().map(|i| i.amount).sum();

        self.modality = PaymentModality::Financiado;
        self.installment_count = Some(schedule.len() as i32);
        self.interest_rate = interest_rate;
        self.installment_value = Some(installment_value);
        self.amount_due = amount_due;
        self.balance = amount_due - self.paid_amount;
        self.due_date = last.due_date;
        self.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    /// Record money applied to this invoice and settle it when covered
    pub fn register_payment(&mut self, allocated: Decimal) -> Result<()> {
        if allocated < Decimal::ZERO {
            return Err(AppError::validation("Applied amount cannot be negative"));
        }
        if allocated > self.balance + TOLERANCE {
            return Err(AppError::validation(format!(
                "Applied amount {} exceeds invoice balance {}",
                allocated, self.balance
            )));
        }

        self.paid_amount += allocated;
        self.balance = (self.amount_due - self.paid_amount).max(Decimal::ZERO);
        self.updated_at = Utc::now().naive_utc();

        if self.is_settled() && self.status != InvoiceStatus::Pagada {
            self.transition_to(InvoiceStatus::Pagada)?;
        }
        Ok(())
    }

    /// Cash invoice past its due date with money still owed
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        !self.is_settled() && self.due_date < today
    }
}

/// Response for invoice endpoints
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub client_name: String,
    pub client_document: String,
    pub concept: String,
    pub total: Decimal,
    pub modality: PaymentModality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<i32>,
    pub interest_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_value: Option<Decimal>,
    pub amount_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            case_id: invoice.case_id,
            client_name: invoice.client_name,
            client_document: invoice.client_document,
            concept: invoice.concept,
            total: invoice.total,
            modality: invoice.modality,
            installment_count: invoice.installment_count,
            interest_rate: invoice.interest_rate,
            installment_value: invoice.installment_value,
            amount_due: invoice.amount_due,
            paid_amount: invoice.paid_amount,
            balance: invoice.balance,
            status: invoice.status,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            created_at: invoice.created_at.and_utc().to_rfc3339(),
            updated_at: invoice.updated_at.and_utc().to_rfc3339(),
        }
    }
}
