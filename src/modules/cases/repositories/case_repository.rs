use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{MySqlConnection, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::cases::models::{CaseStatus, LegalCase};

const CASE_COLUMNS: &str = r#"
    id, case_number, conciliation_id, client_name, client_document, status,
    opened_at, created_at, updated_at
"#;

pub struct CaseRepository {
    pool: MySqlPool,
}

impl CaseRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, conn: &mut MySqlConnection, case: &LegalCase) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO legal_cases (
                id, case_number, conciliation_id, client_name, client_document,
                status, opened_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&case.id)
        .bind(&case.case_number)
        .bind(&case.conciliation_id)
        .bind(&case.client_name)
        .bind(&case.client_document)
        .bind(case.status.as_str())
        .bind(case.opened_at)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<LegalCase>> {
        let sql = format!("SELECT {} FROM legal_cases WHERE id = ?", CASE_COLUMNS);

        let row = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LegalCase::try_from).transpose()
    }

    pub async fn find_by_id_for_update(
        &self,
        conn: &mut MySqlConnection,
        id: &str,
    ) -> Result<Option<LegalCase>> {
        let sql = format!(
            "SELECT {} FROM legal_cases WHERE id = ? FOR UPDATE",
            CASE_COLUMNS
        );

        let row = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(LegalCase::try_from).transpose()
    }

    pub async fn list(
        &self,
        status: Option<CaseStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LegalCase>> {
        let sql = format!(
            "SELECT {} FROM legal_cases WHERE (? IS NULL OR status = ?) \
             ORDER BY opened_at DESC, case_number DESC LIMIT ? OFFSET ?",
            CASE_COLUMNS
        );
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, CaseRow>(&sql)
            .bind(status)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LegalCase::try_from).collect()
    }

    pub async fn update_status(&self, conn: &mut MySqlConnection, case: &LegalCase) -> Result<()> {
        sqlx::query("UPDATE legal_cases SET status = ?, updated_at = ? WHERE id = ?")
            .bind(case.status.as_str())
            .bind(case.updated_at)
            .bind(&case.id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: String,
    case_number: String,
    conciliation_id: Option<String>,
    client_name: String,
    client_document: String,
    status: String,
    opened_at: NaiveDate,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<CaseRow> for LegalCase {
    type Error = AppError;

    fn try_from(row: CaseRow) -> Result<Self> {
        let status: CaseStatus = row.status.parse().map_err(|_| {
            AppError::Internal(format!("Invalid case status in database: {}", row.status))
        })?;

        Ok(LegalCase {
            id: row.id,
            case_number: row.case_number,
            conciliation_id: row.conciliation_id,
            client_name: row.client_name,
            client_document: row.client_document,
            status,
            opened_at: row.opened_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
