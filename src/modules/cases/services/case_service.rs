use sqlx::MySqlPool;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::cases::models::{CaseStatus, LegalCase};
use crate::modules::cases::repositories::CaseRepository;

pub struct CaseService {
    pool: MySqlPool,
    repository: CaseRepository,
}

impl CaseService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: CaseRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn get_case(&self, id: &str) -> Result<LegalCase> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Case {}", id)))
    }

    pub async fn list_cases(
        &self,
        status: Option<CaseStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LegalCase>> {
        self.repository.list(status, limit, offset).await
    }

    /// Move a case through its status table
    pub async fn change_status(&self, id: &str, next: CaseStatus) -> Result<LegalCase> {
        let mut tx = self.pool.begin().await?;

        let mut case = self
            .repository
            .find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Case {}", id)))?;

        let previous = case.status;
        case.transition_to(next)?;
        self.repository.update_status(&mut tx, &case).await?;

        tx.commit().await?;

        info!(
            case_id = %case.id,
            case_number = %case.case_number,
            from = %previous,
            to = %next,
            "Case status changed"
        );

        Ok(case)
    }
}
