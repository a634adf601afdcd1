use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::payments::models::{Payment, PaymentApplication};

pub struct PaymentRepository {
    pool: MySqlPool,
}

impl PaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, conn: &mut MySqlConnection, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, invoice_id, amount, method, reference, allocation_mode,
                allocated_amount, unallocated_amount, paid_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.invoice_id)
        .bind(payment.amount)
        .bind(payment.method.as_str())
        .bind(&payment.reference)
        .bind(payment.allocation_mode.as_str())
        .bind(payment.allocated_amount)
        .bind(payment.unallocated_amount)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_application(
        &self,
        conn: &mut MySqlConnection,
        application: &PaymentApplication,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_applications (id, payment_id, installment_id, amount, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application.id)
        .bind(&application.payment_id)
        .bind(&application.installment_id)
        .bind(application.amount)
        .bind(application.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Payments of an invoice, oldest first
    pub async fn find_by_invoice(&self, invoice_id: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, invoice_id, amount, method, reference, allocation_mode,
                   allocated_amount, unallocated_amount, paid_at, created_at
            FROM payments
            WHERE invoice_id = ?
            ORDER BY paid_at ASC, created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// Every application made by payments of an invoice
    pub async fn find_applications_by_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<PaymentApplication>> {
        let rows = sqlx::query_as::<_, PaymentApplicationRow>(
            r#"
            SELECT pa.id, pa.payment_id, pa.installment_id, pa.amount, pa.created_at
            FROM payment_applications pa
            INNER JOIN payments p ON p.id = pa.payment_id
            WHERE p.invoice_id = ?
            ORDER BY pa.created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PaymentApplication::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    invoice_id: String,
    amount: Decimal,
    method: String,
    reference: Option<String>,
    allocation_mode: String,
    allocated_amount: Decimal,
    unallocated_amount: Decimal,
    paid_at: NaiveDateTime,
    created_at: NaiveDateTime,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let method = row.method.parse().map_err(|_| {
            AppError::Internal(format!("Invalid payment method in database: {}", row.method))
        })?;
        let allocation_mode = row.allocation_mode.parse().map_err(|_| {
            AppError::Internal(format!(
                "Invalid allocation mode in database: {}",
                row.allocation_mode
            ))
        })?;

        Ok(Payment {
            id: row.id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            method,
            reference: row.reference,
            allocation_mode,
            allocated_amount: row.allocated_amount,
            unallocated_amount: row.unallocated_amount,
            paid_at: row.paid_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentApplicationRow {
    id: String,
    payment_id: String,
    installment_id: String,
    amount: Decimal,
    created_at: NaiveDateTime,
}

impl From<PaymentApplicationRow> for PaymentApplication {
    fn from(row: PaymentApplicationRow) -> Self {
        PaymentApplication {
            id: row.id,
            payment_id: row.payment_id,
            installment_id: row.installment_id,
            amount: row.amount,
            created_at: row.created_at,
        }
    }
}
