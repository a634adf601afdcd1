use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus, PaymentModality};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, case_id, client_name, client_document, concept, total,
    modality, installment_count, interest_rate, installment_value, amount_due,
    paid_amount, balance, status, issue_date, due_date, created_at, updated_at
"#;

/// Filters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub case_id: Option<String>,
    pub client_document: Option<String>,
}

/// Repository for invoice database operations
pub struct InvoiceRepository {
    pool: MySqlPool,
}

impl InvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a new invoice
    pub async fn create(&self, conn: &mut MySqlConnection, invoice: &Invoice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, case_id, client_name, client_document, concept, total,
                modality, installment_count, interest_rate, installment_value, amount_due,
                paid_amount, balance, status, issue_date, due_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.case_id)
        .bind(&invoice.client_name)
        .bind(&invoice.client_document)
        .bind(&invoice.concept)
        .bind(invoice.total)
        .bind(invoice.modality.as_str())
        .bind(invoice.installment_count)
        .bind(invoice.interest_rate)
        .bind(invoice.installment_value)
        .bind(invoice.amount_due)
        .bind(invoice.paid_amount)
        .bind(invoice.balance)
        .bind(invoice.status.as_str())
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS);

        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Load an invoice and lock its row for the rest of the transaction
    pub async fn find_by_id_for_update(
        &self,
        conn: &mut MySqlConnection,
        id: &str,
    ) -> Result<Option<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE id = ? FOR UPDATE",
            INVOICE_COLUMNS
        );

        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// List invoices, newest first
    pub async fn list(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>> {
        let sql = format!(
            r#"
            SELECT {} FROM invoices
            WHERE (? IS NULL OR status = ?)
              AND (? IS NULL OR case_id = ?)
              AND (? IS NULL OR client_document = ?)
            ORDER BY created_at DESC, invoice_number DESC
            LIMIT ? OFFSET ?
            "#,
            INVOICE_COLUMNS
        );

        let status = filter.status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(status)
            .bind(status)
            .bind(&filter.case_id)
            .bind(&filter.case_id)
            .bind(&filter.client_document)
            .bind(&filter.client_document)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    /// Open invoices that should be VENCIDA as of `today`, locked
    ///
    /// Cash invoices past their due date with a balance, and financed
    /// invoices with at least one unpaid installment past due.
    pub async fn find_overdue_candidates_for_update(
        &self,
        conn: &mut MySqlConnection,
        today: NaiveDate,
    ) -> Result<Vec<Invoice>> {
        let sql = format!(
            r#"
            SELECT {} FROM invoices
            WHERE status IN ('GENERADA', 'ENVIADA', 'VENCIDA')
              AND (
                (modality = 'CONTADO' AND due_date < ? AND balance > 0)
                OR (modality = 'FINANCIADO' AND id IN (
                    SELECT invoice_id FROM installments
                    WHERE due_date < ? AND status IN ('PENDIENTE', 'PARCIAL')
                ))
              )
            ORDER BY id
            FOR UPDATE
            "#,
            INVOICE_COLUMNS
        );

        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(today)
            .bind(today)
            .fetch_all(&mut *conn)
            .await?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    /// Persist every mutable column of an invoice
    pub async fn update(&self, conn: &mut MySqlConnection, invoice: &Invoice) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET case_id = ?, modality = ?, installment_count = ?, interest_rate = ?,
                installment_value = ?, amount_due = ?, paid_amount = ?, balance = ?,
                status = ?, due_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&invoice.case_id)
        .bind(invoice.modality.as_str())
        .bind(invoice.installment_count)
        .bind(invoice.interest_rate)
        .bind(invoice.installment_value)
        .bind(invoice.amount_due)
        .bind(invoice.paid_amount)
        .bind(invoice.balance)
        .bind(invoice.status.as_str())
        .bind(invoice.due_date)
        .bind(invoice.updated_at)
        .bind(&invoice.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Database row for the invoices table
#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    case_id: Option<String>,
    client_name: String,
    client_document: String,
    concept: String,
    total: Decimal,
    modality: String,
    installment_count: Option<i32>,
    interest_rate: Decimal,
    installment_value: Option<Decimal>,
    amount_due: Decimal,
    paid_amount: Decimal,
    balance: Decimal,
    status: String,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = AppError;

    fn try_from(row: InvoiceRow) -> Result<Self> {
        let status: InvoiceStatus = row.status.parse().map_err(|_| {
            AppError::Internal(format!("Invalid invoice status in database: {}", row.status))
        })?;
        let modality: PaymentModality = row.modality.parse().map_err(|_| {
            AppError::Internal(format!("Invalid modality in database: {}", row.modality))
        })?;

        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            case_id: row.case_id,
            client_name: row.client_name,
            client_document: row.client_document,
            concept: row.concept,
            total: row.total,
            modality,
            installment_count: row.installment_count,
            interest_rate: row.interest_rate,
            installment_value: row.installment_value,
            amount_due: row.amount_due,
            paid_amount: row.paid_amount,
            balance: row.balance,
            status,
            issue_date: row.issue_date,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
