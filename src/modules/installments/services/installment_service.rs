use rust_decimal::Decimal;
use sqlx::MySqlPool;
use tracing::debug;

use crate::core::{AppError, Result};
use crate::modules::installments::{
    models::{FinancingTerms, Installment},
    repositories::InstallmentRepository,
    services::{AmortizationCalculator, AmortizationSchedule},
};
use crate::modules::invoices::repositories::InvoiceRepository;

/// Service for installment reads and schedule quotes
pub struct InstallmentService {
    repository: InstallmentRepository,
    invoices: InvoiceRepository,
}

impl InstallmentService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: InstallmentRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool),
        }
    }

    /// Installments of an invoice ordered by number
    ///
    /// Empty for cash invoices; 404 when the invoice does not exist.
    pub async fn get_installments(&self, invoice_id: &str) -> Result<Vec<Installment>> {
        if self.invoices.find_by_id(invoice_id).await?.is_none() {
            return Err(AppError::not_found(format!("Invoice {}", invoice_id)));
        }

        let installments = self.repository.find_by_invoice(invoice_id).await?;
        debug!(invoice_id, count = installments.len(), "Installments loaded");

        Ok(installments)
    }

    /// Amortization table for the given terms, without persistence
    pub fn quote(principal: Decimal, terms: &FinancingTerms) -> Result<AmortizationSchedule> {
        AmortizationCalculator::schedule(principal, terms)
    }
}
