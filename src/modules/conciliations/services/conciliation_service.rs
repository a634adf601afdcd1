use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::cases::{models::LegalCase, repositories::CaseRepository};
use crate::modules::conciliations::{
    models::{
        AcceptConciliationRequest, Conciliation, ConciliationStatus, CreateConciliationRequest,
    },
    repositories::ConciliationRepository,
};
use crate::modules::installments::{models::Installment, repositories::InstallmentRepository};
use crate::modules::invoices::{
    models::{CreateInvoiceRequest, Invoice, InvoiceResponse},
    repositories::InvoiceRepository,
    services::InvoiceService,
};

const DEFAULT_FEE_CONCEPT: &str = "Honorarios de conciliación";

/// Everything produced by accepting a conciliation
#[derive(Debug, Serialize)]
pub struct AcceptanceOutcome {
    pub conciliation: Conciliation,
    pub case: LegalCase,
    pub invoice: InvoiceResponse,
    pub installments: Vec<Installment>,
}

pub struct ConciliationService {
    pool: MySqlPool,
    repository: ConciliationRepository,
    cases: CaseRepository,
    invoices: InvoiceRepository,
    installments: InstallmentRepository,
}

impl ConciliationService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: ConciliationRepository::new(pool.clone()),
            cases: CaseRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            installments: InstallmentRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create_conciliation(
        &self,
        request: CreateConciliationRequest,
    ) -> Result<Conciliation> {
        let conciliation = Conciliation::new(request)?;
        self.repository.create(&conciliation).await?;

        info!(
            conciliation_id = %conciliation.id,
            fee_amount = %conciliation.fee_amount,
            "Conciliation scheduled"
        );

        Ok(conciliation)
    }

    pub async fn get_conciliation(&self, id: &str) -> Result<Conciliation> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conciliation {}", id)))
    }

    pub async fn list_conciliations(
        &self,
        status: Option<ConciliationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conciliation>> {
        self.repository.list(status, limit, offset).await
    }

    /// Simple transitions: start, reject, desist
    pub async fn transition(
        &self,
        id: &str,
        next: ConciliationStatus,
        note: Option<String>,
    ) -> Result<Conciliation> {
        if next == ConciliationStatus::Aceptada {
            return Err(AppError::validation(
                "Use the accept operation to accept a conciliation",
            ));
        }

        let mut tx = self.pool.begin().await?;

        let mut conciliation = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conciliation {}", id)))?;

        let previous = conciliation.status;
        conciliation.transition_to(next)?;
        conciliation.add_note(note);
        self.repository.update(&mut tx, &conciliation).await?;

        tx.commit().await?;

        info!(
            conciliation_id = %conciliation.id,
            from = %previous,
            to = %next,
            "Conciliation status changed"
        );

        Ok(conciliation)
    }

    /// Accept a conciliation: open the case and bill the fee, atomically
    ///
    /// The case, the invoice and (when financing terms are given) its
    /// installments are created in the same transaction that marks the
    /// conciliation ACEPTADA.
    pub async fn accept(
        &self,
        id: &str,
        request: AcceptConciliationRequest,
        today: NaiveDate,
    ) -> Result<AcceptanceOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut conciliation = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conciliation {}", id)))?;

        conciliation.transition_to(ConciliationStatus::Aceptada)?;

        let case = LegalCase::open(
            Some(conciliation.id.clone()),
            &conciliation.client_name,
            &conciliation.client_document,
            today,
        )?;
        self.cases.create(&mut tx, &case).await?;

        let mut invoice = Invoice::new(
            CreateInvoiceRequest {
                client_name: conciliation.client_name.clone(),
                client_document: conciliation.client_document.clone(),
                concept: request
                    .concept
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FEE_CONCEPT.to_string()),
                total: request.fee_amount.unwrap_or(conciliation.fee_amount),
                issue_date: Some(today),
                due_date: request.invoice_due_date,
                case_id: Some(case.id.clone()),
            },
            today,
        )?;

        let installments = match &request.financing {
            Some(terms) => InvoiceService::build_financing(&mut invoice, terms)?,
            None => Vec::new(),
        };

        self.invoices.create(&mut tx, &invoice).await?;
        self.installments.insert_batch(&mut tx, &installments).await?;

        conciliation.link_outcome(&case.id, &invoice.id);
        self.repository.update(&mut tx, &conciliation).await?;

        tx.commit().await?;

        info!(
            conciliation_id = %conciliation.id,
            case_number = %case.case_number,
            invoice_number = %invoice.invoice_number,
            installments = installments.len(),
            "Conciliation accepted"
        );

        Ok(AcceptanceOutcome {
            conciliation,
            case,
            invoice: InvoiceResponse::from(invoice),
            installments,
        })
    }
}
