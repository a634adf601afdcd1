use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::installments::{models::Installment, repositories::InstallmentRepository};
use crate::modules::invoices::{
    models::{Invoice, InvoiceResponse},
    repositories::InvoiceRepository,
};
use crate::modules::payments::{
    models::{AllocationMode, Payment, PaymentApplication, RegisterPaymentRequest},
    repositories::PaymentRepository,
    services::payment_allocator::{self, AllocationPlan, OutstandingInstallment},
};

/// Result of a committed payment
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub applications: Vec<PaymentApplication>,
    /// Installments touched by this payment, after the update
    pub installments: Vec<Installment>,
    pub invoice: InvoiceResponse,
}

/// Allocation computed without persisting anything
#[derive(Debug, Serialize)]
pub struct PaymentPreview {
    pub invoice_id: String,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub plan: AllocationPlan,
}

#[derive(Debug, Serialize)]
pub struct PaymentWithApplications {
    pub payment: Payment,
    pub applications: Vec<PaymentApplication>,
}

/// Build the allocation plan for a payment against an invoice
///
/// Shared by registration and preview so both see the same rules.
pub fn plan_payment(
    invoice: &Invoice,
    installments: &[Installment],
    request: &RegisterPaymentRequest,
    today: NaiveDate,
) -> Result<AllocationPlan> {
    request.validate()?;

    if !invoice.status.accepts_payments() {
        return Err(AppError::validation(format!(
            "Invoice {} does not accept payments (status {})",
            invoice.invoice_number, invoice.status
        )));
    }

    let plan = if invoice.is_financed() {
        let outstanding: Vec<OutstandingInstallment> =
            installments.iter().map(OutstandingInstallment::from).collect();

        match request.mode {
            AllocationMode::Automatica => {
                payment_allocator::allocate_automatic(request.amount, &outstanding, today)?
            }
            AllocationMode::Manual => {
                payment_allocator::allocate_manual(request.amount, &outstanding, &request.allocations)?
            }
        }
    } else {
        if request.mode == AllocationMode::Manual {
            return Err(AppError::validation(
                "Cash invoices only accept AUTOMATICA allocation",
            ));
        }
        payment_allocator::allocate_cash(request.amount, invoice.balance)?
    };

    if plan.allocated <= Decimal::ZERO {
        return Err(AppError::validation(format!(
            "Invoice {} has no outstanding balance",
            invoice.invoice_number
        )));
    }

    Ok(plan)
}

/// Payment registration, preview and listing
pub struct PaymentService {
    pool: MySqlPool,
    repository: PaymentRepository,
    invoices: InvoiceRepository,
    installments: InstallmentRepository,
}

impl PaymentService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: PaymentRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            installments: InstallmentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Register a payment and apply it in a single transaction
    ///
    /// The invoice row and its installments are locked for the duration, so
    /// concurrent payments on the same invoice are serialized. Any error
    /// drops the transaction and leaves no partial state behind.
    pub async fn register_payment(
        &self,
        invoice_id: &str,
        request: RegisterPaymentRequest,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<PaymentReceipt> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut invoice = self
            .invoices
            .find_by_id_for_update(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;

        let mut installments = self
            .installments
            .find_by_invoice_for_update(&mut tx, &invoice.id)
            .await?;

        let plan = plan_payment(&invoice, &installments, &request, today)?;

        let payment = Payment::new(
            invoice.id.clone(),
            &request,
            plan.allocated,
            plan.unallocated,
            now,
        );
        self.repository.insert(&mut tx, &payment).await?;

        let mut applications = Vec::with_capacity(plan.allocations.len());
        let mut touched = Vec::with_capacity(plan.allocations.len());

        for allocation in &plan.allocations {
            let installment = installments
                .iter_mut()
                .find(|i| i.id == allocation.installment_id)
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Planned installment {} is not loaded",
                        allocation.installment_id
                    ))
                })?;

            installment.apply_payment(allocation.amount, now)?;
            self.installments
                .update_payment_state(&mut tx, installment)
                .await?;

            let application =
                PaymentApplication::new(&payment.id, &installment.id, allocation.amount, now);
            self.repository.insert_application(&mut tx, &application).await?;

            applications.push(application);
            touched.push(installment.clone());
        }

        invoice.register_payment(plan.allocated)?;
        self.invoices.update(&mut tx, &invoice).await?;

        tx.commit().await?;

        if plan.unallocated > Decimal::ZERO {
            warn!(
                invoice_id = %invoice.id,
                payment_id = %payment.id,
                unallocated = %plan.unallocated,
                "Payment exceeds outstanding balance; excess left unallocated"
            );
        }

        info!(
            invoice_id = %invoice.id,
            payment_id = %payment.id,
            amount = %payment.amount,
            allocated = %plan.allocated,
            mode = payment.allocation_mode.as_str(),
            applications = applications.len(),
            invoice_status = %invoice.status,
            balance = %invoice.balance,
            "Payment registered"
        );

        Ok(PaymentReceipt {
            payment,
            applications,
            installments: touched,
            invoice: InvoiceResponse::from(invoice),
        })
    }

    /// Compute the allocation a payment would get, without persisting
    pub async fn preview_payment(
        &self,
        invoice_id: &str,
        request: RegisterPaymentRequest,
        today: NaiveDate,
    ) -> Result<PaymentPreview> {
        request.validate()?;

        let invoice = self
            .invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;
        let installments = self.installments.find_by_invoice(&invoice.id).await?;

        let plan = plan_payment(&invoice, &installments, &request, today)?;

        Ok(PaymentPreview {
            invoice_id: invoice.id,
            balance_before: invoice.balance,
            balance_after: (invoice.balance - plan.allocated).max(Decimal::ZERO),
            plan,
        })
    }

    /// Payments of an invoice with their installment applications
    pub async fn list_payments(&self, invoice_id: &str) -> Result<Vec<PaymentWithApplications>> {
        if self.invoices.find_by_id(invoice_id).await?.is_none() {
            return Err(AppError::not_found(format!("Invoice {}", invoice_id)));
        }

        let payments = self.repository.find_by_invoice(invoice_id).await?;
        let mut applications = self.repository.find_applications_by_invoice(invoice_id).await?;

        Ok(payments
            .into_iter()
            .map(|payment| {
                let (own, rest): (Vec<_>, Vec<_>) = applications
                    .drain(..)
                    .partition(|a| a.payment_id == payment.id);
                applications = rest;
                PaymentWithApplications {
                    payment,
                    applications: own,
                }
            })
            .collect())
    }
}
