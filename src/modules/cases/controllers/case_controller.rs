use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::cases::models::{CaseStatus, ChangeCaseStatusRequest};
use crate::modules::cases::services::CaseService;

#[derive(Debug, Deserialize)]
pub struct ListCasesQuery {
    pub status: Option<CaseStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /cases
pub async fn list_cases(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ListCasesQuery>,
) -> Result<HttpResponse> {
    user.require(Permission::CasesRead)?;

    let service = CaseService::new(pool.get_ref().clone());
    let cases = service
        .list_cases(query.status, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;

    Ok(HttpResponse::Ok().json(cases))
}

/// GET /cases/{id}
pub async fn get_case(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    user.require(Permission::CasesRead)?;

    let service = CaseService::new(pool.get_ref().clone());
    let case = service.get_case(&path).await?;

    Ok(HttpResponse::Ok().json(case))
}

/// POST /cases/{id}/status
pub async fn change_case_status(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    request: web::Json<ChangeCaseStatusRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::CasesWrite)?;

    let service = CaseService::new(pool.get_ref().clone());
    let case = service.change_status(&path, request.status).await?;

    Ok(HttpResponse::Ok().json(case))
}

/// Configure case routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cases")
            .route("", web::get().to(list_cases))
            .route("/{id}", web::get().to(get_case))
            .route("/{id}/status", web::post().to(change_case_status)),
    );
}
