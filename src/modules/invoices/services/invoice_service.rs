use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::cases::repositories::CaseRepository;
use crate::modules::installments::{
    models::{FinancingTerms, Installment},
    repositories::InstallmentRepository,
    services::AmortizationCalculator,
};
use crate::modules::invoices::{
    models::{CreateInvoiceRequest, Invoice, InvoiceStatus},
    repositories::{InvoiceFilter, InvoiceRepository},
};

/// Result of an overdue refresh run
#[derive(Debug, Default, Serialize)]
pub struct OverdueRefreshSummary {
    pub as_of: Option<NaiveDate>,
    pub invoices_marked: usize,
    pub installments_marked: usize,
}

/// Service layer for invoice business logic
pub struct InvoiceService {
    pool: MySqlPool,
    repository: InvoiceRepository,
    installments: InstallmentRepository,
    cases: CaseRepository,
}

impl InvoiceService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            installments: InstallmentRepository::new(pool.clone()),
            cases: CaseRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a cash invoice in GENERADA
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        today: NaiveDate,
    ) -> Result<Invoice> {
        let invoice = Invoice::new(request, today)?;

        if let Some(case_id) = invoice.case_id.as_deref() {
            if self.cases.find_by_id(case_id).await?.is_none() {
                return Err(AppError::validation(format!("Case {} does not exist", case_id)));
            }
        }

        let mut tx = self.pool.begin().await?;
        self.repository.create(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total,
            "Invoice created"
        );

        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))
    }

    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>> {
        self.repository.list(&filter, limit, offset).await
    }

    /// Manual status change through the invoice adjacency table
    pub async fn change_status(
        &self,
        id: &str,
        next: InvoiceStatus,
        today: NaiveDate,
    ) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))?;

        if next == InvoiceStatus::Vencida && !self.has_overdue_debt(&mut tx, &invoice, today).await? {
            return Err(AppError::validation(
                "Invoice has no overdue balance and cannot be marked VENCIDA",
            ));
        }

        let previous = invoice.status;
        invoice.transition_to(next)?;
        self.repository.update(&mut tx, &invoice).await?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            from = %previous,
            to = %next,
            "Invoice status changed"
        );

        Ok(invoice)
    }

    async fn has_overdue_debt(
        &self,
        conn: &mut sqlx::MySqlConnection,
        invoice: &Invoice,
        today: NaiveDate,
    ) -> Result<bool> {
        if !invoice.is_financed() {
            return Ok(invoice.is_past_due(today));
        }

        let installments = self
            .installments
            .find_by_invoice_for_update(conn, &invoice.id)
            .await?;
        Ok(installments.iter().any(|i| i.is_overdue(today)))
    }

    /// Turn a cash invoice into a financed one and persist its schedule
    pub async fn finance_invoice(
        &self,
        id: &str,
        terms: FinancingTerms,
    ) -> Result<(Invoice, Vec<Installment>)> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))?;

        let existing = self
            .installments
            .find_by_invoice_for_update(&mut tx, &invoice.id)
            .await?;
        if !existing.is_empty() {
            return Err(AppError::validation(
                "Invoice already has installments; they cannot be regenerated",
            ));
        }

        let installments = Self::build_financing(&mut invoice, &terms)?;

        self.repository.update(&mut tx, &invoice).await?;
        self.installments.insert_batch(&mut tx, &installments).await?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            installment_count = installments.len(),
            interest_rate = %terms.monthly_interest_rate,
            amount_due = %invoice.amount_due,
            "Invoice financed"
        );

        Ok((invoice, installments))
    }

    /// Compute the French schedule for an invoice and switch it to FINANCIADO
    ///
    /// Nothing is persisted; the caller stores both the invoice and the
    /// returned installments in its own transaction.
    pub fn build_financing(invoice: &mut Invoice, terms: &FinancingTerms) -> Result<Vec<Installment>> {
        invoice.ensure_financeable()?;

        if terms.first_due_date < invoice.issue_date {
            return Err(AppError::validation(format!(
                "First installment due date {} cannot be before issue date {}",
                terms.first_due_date, invoice.issue_date
            )));
        }

        let schedule = AmortizationCalculator::schedule(invoice.total, terms)?;
        let installments = AmortizationCalculator::to_installments(&invoice.id, &schedule)?;

        invoice.apply_financing(
            terms.monthly_interest_rate,
            schedule.installment_value,
            &installments,
        )?;

        Ok(installments)
    }

    /// Mark overdue installments and invoices as of `today`
    pub async fn refresh_overdue(&self, today: NaiveDate) -> Result<OverdueRefreshSummary> {
        let mut tx = self.pool.begin().await?;
        let mut summary = OverdueRefreshSummary {
            as_of: Some(today),
            ..Default::default()
        };

        let candidates = self
            .repository
            .find_overdue_candidates_for_update(&mut tx, today)
            .await?;

        for mut invoice in candidates {
            if invoice.is_financed() {
                let installments = self
                    .installments
                    .find_by_invoice_for_update(&mut tx, &invoice.id)
                    .await?;

                for mut installment in installments {
                    if installment.mark_overdue_if_due(today)? {
                        self.installments
                            .update_payment_state(&mut tx, &installment)
                            .await?;
                        summary.installments_marked += 1;
                    }
                }
            }

            if invoice.status != InvoiceStatus::Vencida {
                if let Err(e) = invoice.transition_to(InvoiceStatus::Vencida) {
                    warn!(invoice_id = %invoice.id, error = %e, "Skipping overdue invoice");
                    continue;
                }
                self.repository.update(&mut tx, &invoice).await?;
                summary.invoices_marked += 1;
            }
        }

        tx.commit().await?;

        info!(
            as_of = %today,
            invoices_marked = summary.invoices_marked,
            installments_marked = summary.installments_marked,
            "Overdue refresh completed"
        );

        Ok(summary)
    }
}
