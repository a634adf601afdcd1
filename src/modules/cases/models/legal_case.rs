use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Legal case (proceso) opened after an accepted conciliation
#[derive(Debug, Clone, Serialize)]
pub struct LegalCase {
    pub id: String,
    /// PRO-2025-1A2B3C4D
    pub case_number: String,
    pub conciliation_id: Option<String>,
    pub client_name: String,
    pub client_document: String,
    pub status: CaseStatus,
    pub opened_at: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Abierto,
    EnTramite,
    Cerrado,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [CaseStatus::Abierto, CaseStatus::EnTramite, CaseStatus::Cerrado];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Abierto => "ABIERTO",
            CaseStatus::EnTramite => "EN_TRAMITE",
            CaseStatus::Cerrado => "CERRADO",
        }
    }

    pub fn allowed_transitions(&self) -> &'static [CaseStatus] {
        use CaseStatus::*;
        match self {
            Abierto => &[EnTramite, Cerrado],
            EnTramite => &[Cerrado],
            Cerrado => &[],
        }
    }

    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Invalid case status: {}", s)))
    }
}

impl LegalCase {
    /// Open a new case in ABIERTO
    pub fn open(
        conciliation_id: Option<String>,
        client_name: &str,
        client_document: &str,
        opened_at: NaiveDate,
    ) -> Result<Self> {
        if client_name.trim().is_empty() {
            return Err(AppError::validation("Client name cannot be empty"));
        }
        if client_document.trim().is_empty() {
            return Err(AppError::validation("Client document cannot be empty"));
        }

        let id = Uuid::new_v4();
        let suffix: String = id.simple().to_string().chars().take(8).collect();
        let now = Utc::now().naive_utc();

        Ok(Self {
            id: id.to_string(),
            case_number: format!("PRO-{}-{}", opened_at.year(), suffix.to_uppercase()),
            conciliation_id,
            client_name: client_name.trim().to_string(),
            client_document: client_document.trim().to_string(),
            status: CaseStatus::Abierto,
            opened_at,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition_to(&mut self, next: CaseStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Invalid case status transition from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now().naive_utc();
        Ok(())
    }
}

/// Request body for POST /cases/{id}/status
#[derive(Debug, Deserialize)]
pub struct ChangeCaseStatusRequest {
    pub status: CaseStatus,
}
