use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::conciliations::models::{Conciliation, ConciliationStatus};

const CONCILIATION_COLUMNS: &str = r#"
    id, client_name, client_document, debtor_summary, hearing_date, fee_amount,
    status, case_id, invoice_id, notes, created_at, updated_at
"#;

pub struct ConciliationRepository {
    pool: MySqlPool,
}

impl ConciliationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, conciliation: &Conciliation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conciliations (
                id, client_name, client_document, debtor_summary, hearing_date, fee_amount,
                status, case_id, invoice_id, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conciliation.id)
        .bind(&conciliation.client_name)
        .bind(&conciliation.client_document)
        .bind(&conciliation.debtor_summary)
        .bind(conciliation.hearing_date)
        .bind(conciliation.fee_amount)
        .bind(conciliation.status.as_str())
        .bind(&conciliation.case_id)
        .bind(&conciliation.invoice_id)
        .bind(&conciliation.notes)
        .bind(conciliation.created_at)
        .bind(conciliation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Conciliation>> {
        let sql = format!("SELECT {} FROM conciliations WHERE id = ?", CONCILIATION_COLUMNS);

        let row = sqlx::query_as::<_, ConciliationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Conciliation::try_from).transpose()
    }

    pub async fn find_by_id_for_update(
        &self,
        conn: &mut MySqlConnection,
        id: &str,
    ) -> Result<Option<Conciliation>> {
        let sql = format!(
            "SELECT {} FROM conciliations WHERE id = ? FOR UPDATE",
            CONCILIATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ConciliationRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Conciliation::try_from).transpose()
    }

    pub async fn list(
        &self,
        status: Option<ConciliationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conciliation>> {
        let sql = format!(
            "SELECT {} FROM conciliations WHERE (? IS NULL OR status = ?) \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            CONCILIATION_COLUMNS
        );
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, ConciliationRow>(&sql)
            .bind(status)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Conciliation::try_from).collect()
    }

    /// Persist status, outcome links and notes
    pub async fn update(&self, conn: &mut MySqlConnection, conciliation: &Conciliation) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE conciliations
            SET status = ?, case_id = ?, invoice_id = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(conciliation.status.as_str())
        .bind(&conciliation.case_id)
        .bind(&conciliation.invoice_id)
        .bind(&conciliation.notes)
        .bind(conciliation.updated_at)
        .bind(&conciliation.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ConciliationRow {
    id: String,
    client_name: String,
    client_document: String,
    debtor_summary: Option<String>,
    hearing_date: Option<NaiveDate>,
    fee_amount: Decimal,
    status: String,
    case_id: Option<String>,
    invoice_id: Option<String>,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<ConciliationRow> for Conciliation {
    type Error = AppError;

    fn try_from(row: ConciliationRow) -> Result<Self> {
        let status: ConciliationStatus = row.status.parse().map_err(|_| {
            AppError::Internal(format!(
                "Invalid conciliation status in database: {}",
                row.status
            ))
        })?;

        Ok(Conciliation {
            id: row.id,
            client_name: row.client_name,
            client_document: row.client_document,
            debtor_summary: row.debtor_summary,
            hearing_date: row.hearing_date,
            fee_amount: row.fee_amount,
            status,
            case_id: row.case_id,
            invoice_id: row.invoice_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
