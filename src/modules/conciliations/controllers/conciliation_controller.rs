use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::MySqlPool;

use crate::core::{BusinessCalendar, Result};
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::conciliations::{
    models::{
        AcceptConciliationRequest, CloseConciliationRequest, ConciliationStatus,
        CreateConciliationRequest,
    },
    services::ConciliationService,
};

#[derive(Debug, Deserialize)]
pub struct ListConciliationsQuery {
    pub status: Option<ConciliationStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /conciliations
pub async fn create_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    request: web::Json<CreateConciliationRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::ConciliationsWrite)?;

    let service = ConciliationService::new(pool.get_ref().clone());
    let conciliation = service.create_conciliation(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(conciliation))
}

/// GET /conciliations
pub async fn list_conciliations(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ListConciliationsQuery>,
) -> Result<HttpResponse> {
    user.require(Permission::ConciliationsRead)?;

    let service = ConciliationService::new(pool.get_ref().clone());
    let conciliations = service
        .list_conciliations(query.status, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;

    Ok(HttpResponse::Ok().json(conciliations))
}

/// GET /conciliations/{id}
pub async fn get_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    user.require(Permission::ConciliationsRead)?;

    let service = ConciliationService::new(pool.get_ref().clone());
    let conciliation = service.get_conciliation(&path).await?;

    Ok(HttpResponse::Ok().json(conciliation))
}

async fn transition(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    id: &str,
    next: ConciliationStatus,
    notes: Option<String>,
) -> Result<HttpResponse> {
    user.require(Permission::ConciliationsWrite)?;

    let service = ConciliationService::new(pool.get_ref().clone());
    let conciliation = service.transition(id, next, notes).await?;

    Ok(HttpResponse::Ok().json(conciliation))
}

/// POST /conciliations/{id}/start
pub async fn start_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    transition(user, pool, &path, ConciliationStatus::EnCurso, None).await
}

/// POST /conciliations/{id}/reject
pub async fn reject_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    request: Option<web::Json<CloseConciliationRequest>>,
) -> Result<HttpResponse> {
    let notes = request.and_then(|r| r.into_inner().notes);
    transition(user, pool, &path, ConciliationStatus::Rechazada, notes).await
}

/// POST /conciliations/{id}/desist
pub async fn desist_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    request: Option<web::Json<CloseConciliationRequest>>,
) -> Result<HttpResponse> {
    let notes = request.and_then(|r| r.into_inner().notes);
    transition(user, pool, &path, ConciliationStatus::Desistida, notes).await
}

/// POST /conciliations/{id}/accept
///
/// Opens the legal case and bills the fee in one transaction.
pub async fn accept_conciliation(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    path: web::Path<String>,
    request: web::Json<AcceptConciliationRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::ConciliationsWrite)?;

    let service = ConciliationService::new(pool.get_ref().clone());
    let outcome = service
        .accept(&path, request.into_inner(), calendar.today())
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Configure conciliation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/conciliations")
            .route("", web::post().to(create_conciliation))
            .route("", web::get().to(list_conciliations))
            .route("/{id}", web::get().to(get_conciliation))
            .route("/{id}/start", web::post().to(start_conciliation))
            .route("/{id}/reject", web::post().to(reject_conciliation))
            .route("/{id}/desist", web::post().to(desist_conciliation))
            .route("/{id}/accept", web::post().to(accept_conciliation)),
    );
}
