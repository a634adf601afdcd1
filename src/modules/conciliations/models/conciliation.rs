use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::money;
use crate::core::{AppError, Result};
use crate::modules::installments::models::FinancingTerms;

/// Conciliation (pre-litigation settlement hearing)
#[derive(Debug, Clone, Serialize)]
pub struct Conciliation {
    pub id: String,
    pub client_name: String,
    pub client_document: String,
    pub debtor_summary: Option<String>,
    pub hearing_date: Option<NaiveDate>,
    /// Agreed fee billed when the conciliation is accepted
    pub fee_amount: Decimal,
    pub status: ConciliationStatus,
    /// Set on acceptance
    pub case_id: Option<String>,
    /// Set on acceptance
    pub invoice_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConciliationStatus {
    Programada,
    EnCurso,
    Aceptada,
    Rechazada,
    Desistida,
}

impl ConciliationStatus {
    pub const ALL: [ConciliationStatus; 5] = [
        ConciliationStatus::Programada,
        ConciliationStatus::EnCurso,
        ConciliationStatus::Aceptada,
        ConciliationStatus::Rechazada,
        ConciliationStatus::Desistida,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConciliationStatus::Programada => "PROGRAMADA",
            ConciliationStatus::EnCurso => "EN_CURSO",
            ConciliationStatus::Aceptada => "ACEPTADA",
            ConciliationStatus::Rechazada => "RECHAZADA",
            ConciliationStatus::Desistida => "DESISTIDA",
        }
    }

    pub fn allowed_transitions(&self) -> &'static [ConciliationStatus] {
        use ConciliationStatus::*;
        match self {
            Programada => &[EnCurso, Aceptada, Rechazada, Desistida],
            EnCurso => &[Aceptada, Rechazada, Desistida],
            Aceptada | Rechazada | Desistida => &[],
        }
    }

    pub fn can_transition_to(&self, next: ConciliationStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for ConciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConciliationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        ConciliationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid conciliation status: {}", s)))
    }
}

/// Request body for POST /conciliations
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConciliationRequest {
    pub client_name: String,
    pub client_document: String,
    pub debtor_summary: Option<String>,
    pub hearing_date: Option<NaiveDate>,
    pub fee_amount: Decimal,
    pub notes: Option<String>,
}

/// Request body for POST /conciliations/{id}/reject and /desist
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloseConciliationRequest {
    pub notes: Option<String>,
}

/// Billing terms for POST /conciliations/{id}/accept
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptConciliationRequest {
    /// Overrides the agreed fee
    pub fee_amount: Option<Decimal>,
    pub invoice_due_date: NaiveDate,
    pub concept: Option<String>,
    /// Generate installments right away
    pub financing: Option<FinancingTerms>,
}

impl Conciliation {
    pub fn new(request: CreateConciliationRequest) -> Result<Self> {
        if request.client_name.trim().is_empty() {
            return Err(AppError::validation("Client name cannot be empty"));
        }
        if request.client_document.trim().is_empty() {
            return Err(AppError::validation("Client document cannot be empty"));
        }
        money::validate_positive_amount(request.fee_amount, "Fee amount")?;

        let now = Utc::now().naive_utc();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            client_name: request.client_name.trim().to_string(),
            client_document: request.client_document.trim().to_string(),
            debtor_summary: request.debtor_summary,
            hearing_date: request.hearing_date,
            fee_amount: request.fee_amount,
            status: ConciliationStatus::Programada,
            case_id: None,
            invoice_id: None,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition_to(&mut self, next: ConciliationStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Invalid conciliation status transition from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    /// Append a note, keeping earlier ones
    pub fn add_note(&mut self, note: Option<String>) {
        let Some(note) = note.filter(|n| !n.trim().is_empty()) else {
            return;
        };
        self.notes = Some(match self.notes.take() {
            Some(existing) => format!("{}\n{}", existing, note.trim()),
            None => note.trim().to_string(),
        });
    }

    /// Record the case and invoice produced by acceptance
    pub fn link_outcome(&mut self, case_id: &str, invoice_id: &str) {
        self.case_id = Some(case_id.to_string());
        self.invoice_id = Some(invoice_id.to_string());
        self.updated_at = Utc::now().naive_utc();
    }
}
