use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::error::AppError;
use crate::modules::invoices::models::InvoiceStatus;
use crate::modules::reports::models::{CarteraTotals, OverdueItem, StatusCount};

/// Aggregation queries behind the cartera report
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Invoice count per status
    async fn status_counts(&self) -> Result<Vec<StatusCount>, AppError>;

    /// Money totals over non-annulled invoices
    async fn totals(&self) -> Result<CarteraTotals, AppError>;

    /// Unpaid installments and cash invoices due before `as_of`
    async fn overdue_items(&self, as_of: NaiveDate) -> Result<Vec<OverdueItem>, AppError>;
}

pub struct MySqlReportRepository {
    pool: MySqlPool,
}

impl MySqlReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn status_counts(&self) -> Result<Vec<StatusCount>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM invoices GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, invoices)| {
                let status: InvoiceStatus = status.parse().map_err(|_| {
                    AppError::Internal(format!("Invalid invoice status in database: {}", status))
                })?;
                Ok(StatusCount { status, invoices })
            })
            .collect()
    }

    async fn totals(&self) -> Result<CarteraTotals, AppError> {
        let row: TotalsRow = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total), 0) AS invoiced,
                COALESCE(SUM(amount_due), 0) AS amount_due,
                COALESCE(SUM(paid_amount), 0) AS collected,
                COALESCE(SUM(CASE WHEN status IN ('GENERADA', 'ENVIADA', 'VENCIDA')
                    THEN balance ELSE 0 END), 0) AS outstanding
            FROM invoices
            WHERE status <> 'ANULADA'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CarteraTotals {
            invoiced: row.invoiced,
            amount_due: row.amount_due,
            collected: row.collected,
            outstanding: row.outstanding,
        })
    }

    async fn overdue_items(&self, as_of: NaiveDate) -> Result<Vec<OverdueItem>, AppError> {
        let rows: Vec<(String, NaiveDate, Decimal)> = sqlx::query_as(
            r#"
            SELECT i.invoice_id, i.due_date, i.balance
            FROM installments i
            JOIN invoices f ON f.id = i.invoice_id
            WHERE f.status IN ('GENERADA', 'ENVIADA', 'VENCIDA')
              AND i.status <> 'PAGADA'
              AND i.balance > 0
              AND i.due_date < ?
            UNION ALL
            SELECT f.id, f.due_date, f.balance
            FROM invoices f
            WHERE f.status IN ('GENERADA', 'ENVIADA', 'VENCIDA')
              AND f.modality = 'CONTADO'
              AND f.balance > 0
              AND f.due_date < ?
            "#,
        )
        .bind(as_of)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(invoice_id, due_date, balance)| OverdueItem {
                invoice_id,
                due_date,
                balance,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    invoiced: Decimal,
    amount_due: Decimal,
    collected: Decimal,
    outstanding: Decimal,
}
