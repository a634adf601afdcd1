use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::core::Result;
use crate::modules::reports::models::CarteraSummary;
use crate::modules::reports::repositories::{MySqlReportRepository, ReportRepository};

/// Builds cartera reports from the aggregation repository
pub struct ReportService {
    report_repo: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(report_repo: Arc<dyn ReportRepository>) -> Self {
        Self { report_repo }
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self::new(Arc::new(MySqlReportRepository::new(pool)))
    }

    /// Cartera summary with aging buckets as of a business date
    pub async fn cartera_summary(&self, as_of: NaiveDate) -> Result<CarteraSummary> {
        let counts = self.report_repo.status_counts().await?;
        let totals = self.report_repo.totals().await?;
        let overdue_items = self.report_repo.overdue_items(as_of).await?;

        debug!(
            as_of = %as_of,
            overdue_items = overdue_items.len(),
            "Cartera aggregates loaded"
        );

        let summary = CarteraSummary::build(as_of, counts, totals, &overdue_items);

        info!(
            as_of = %as_of,
            outstanding = %summary.totals.outstanding,
            overdue = %summary.overdue,
            overdue_invoices = summary.overdue_invoices,
            "Cartera report generated"
        );

        Ok(summary)
    }
}
