// MySQL persistence for installments (cuotas)
//
// Reads that feed a payment or an overdue refresh can take row locks
// (SELECT ... FOR UPDATE) on the caller's transaction.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::installments::models::{Installment, InstallmentStatus};

const INSTALLMENT_COLUMNS: &str = r#"
    id, invoice_id, installment_number, principal, interest, amount, due_date,
    paid_amount, balance, status, paid_at, created_at, updated_at
"#;

/// Repository for installment database operations
pub struct InstallmentRepository {
    pool: MySqlPool,
}

impl InstallmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a freshly generated schedule
    pub async fn insert_batch(
        &self,
        conn: &mut MySqlConnection,
        installments: &[Installment],
    ) -> Result<()> {
        for installment in installments {
            sqlx::query(
                r#"
                INSERT INTO installments (
                    id, invoice_id, installment_number, principal, interest, amount,
                    due_date, paid_amount, balance, status, paid_at, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&installment.id)
            .bind(&installment.invoice_id)
            .bind(installment.installment_number)
            .bind(installment.principal)
            .bind(installment.interest)
            .bind(installment.amount)
            .bind(installment.due_date)
            .bind(installment.paid_amount)
            .bind(installment.balance)
            .bind(installment.status.as_str())
            .bind(installment.paid_at)
            .bind(installment.created_at)
            .bind(installment.updated_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// All installments of an invoice ordered by number
    pub async fn find_by_invoice(&self, invoice_id: &str) -> Result<Vec<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments WHERE invoice_id = ? ORDER BY installment_number ASC",
            INSTALLMENT_COLUMNS
        );

        let rows = sqlx::query_as::<_, InstallmentRow>(&sql)
            .bind(invoice_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Installment::try_from).collect()
    }

    /// Same as [`find_by_invoice`](Self::find_by_invoice), locking the rows
    pub async fn find_by_invoice_for_update(
        &self,
        conn: &mut MySqlConnection,
        invoice_id: &str,
    ) -> Result<Vec<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments WHERE invoice_id = ? \
             ORDER BY installment_number ASC FOR UPDATE",
            INSTALLMENT_COLUMNS
        );

        let rows = sqlx::query_as::<_, InstallmentRow>(&sql)
            .bind(invoice_id)
            .fetch_all(&mut *conn)
            .await?;

        rows.into_iter().map(Installment::try_from).collect()
    }

    /// Persist the paid projection and status of an installment
    pub async fn update_payment_state(
        &self,
        conn: &mut MySqlConnection,
        installment: &Installment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE installments
            SET paid_amount = ?, balance = ?, status = ?, paid_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(installment.paid_amount)
        .bind(installment.balance)
        .bind(installment.status.as_str())
        .bind(installment.paid_at)
        .bind(installment.updated_at)
        .bind(&installment.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Database row for the installments table
#[derive(sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    invoice_id: String,
    installment_number: i32,
    principal: Decimal,
    interest: Decimal,
    amount: Decimal,
    due_date: NaiveDate,
    paid_amount: Decimal,
    balance: Decimal,
    status: String,
    paid_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<InstallmentRow> for Installment {
    type Error = AppError;

    fn try_from(row: InstallmentRow) -> Result<Self> {
        let status: InstallmentStatus = row.status.parse().map_err(|_| {
            AppError::Internal(format!("Invalid installment status in database: {}", row.status))
        })?;

        Ok(Installment {
            id: row.id,
            invoice_id: row.invoice_id,
            installment_number: row.installment_number,
            principal: row.principal,
            interest: row.interest,
            amount: row.amount,
            due_date: row.due_date,
            paid_amount: row.paid_amount,
            balance: row.balance,
            status,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
