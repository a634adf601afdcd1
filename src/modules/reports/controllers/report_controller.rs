use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;

use crate::core::{BusinessCalendar, Result};
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::reports::services::ReportService;

#[derive(Debug, Deserialize)]
pub struct CarteraReportQuery {
    /// Business date of the snapshot (YYYY-MM-DD), defaults to today
    pub as_of: Option<NaiveDate>,
}

/// GET /reports/cartera
pub async fn get_cartera_report(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    query: web::Query<CarteraReportQuery>,
) -> Result<HttpResponse> {
    user.require(Permission::ReportsRead)?;

    let as_of = query.as_of.unwrap_or_else(|| calendar.today());
    let service = ReportService::from_pool(pool.get_ref().clone());
    let summary = service.cartera_summary(as_of).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/reports/cartera").route(web::get().to(get_cartera_report)));
}
