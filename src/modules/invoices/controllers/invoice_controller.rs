use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::core::{BusinessCalendar, Result};
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::installments::models::{FinancingTerms, Installment};
use crate::modules::invoices::models::{CreateInvoiceRequest, InvoiceResponse, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceFilter;
use crate::modules::invoices::services::InvoiceService;

/// Query parameters for listing invoices
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<InvoiceStatus>,
    pub case_id: Option<String>,
    pub client_document: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct ChangeInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Serialize)]
pub struct FinancedInvoiceResponse {
    pub invoice: InvoiceResponse,
    pub installments: Vec<Installment>,
}

/// Create a new invoice
/// POST /invoices
pub async fn create_invoice(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    request: web::Json<CreateInvoiceRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesWrite)?;

    let service = InvoiceService::new(pool.get_ref().clone());
    let invoice = service
        .create_invoice(request.into_inner(), calendar.today())
        .await?;

    Ok(HttpResponse::Created().json(InvoiceResponse::from(invoice)))
}

/// Get invoice by ID
/// GET /invoices/{id}
pub async fn get_invoice(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesRead)?;

    let service = InvoiceService::new(pool.get_ref().clone());
    let invoice = service.get_invoice(&path).await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// List invoices
/// GET /invoices
pub async fn list_invoices(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ListInvoicesQuery>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesRead)?;

    let query = query.into_inner();
    let filter = InvoiceFilter {
        status: query.status,
        case_id: query.case_id,
        client_document: query.client_document,
    };

    let service = InvoiceService::new(pool.get_ref().clone());
    let invoices = service
        .list_invoices(filter, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;

    let response: Vec<InvoiceResponse> = invoices.into_iter().map(InvoiceResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Manual status transition
/// POST /invoices/{id}/status
pub async fn change_invoice_status(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    path: web::Path<String>,
    request: web::Json<ChangeInvoiceStatusRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesWrite)?;

    let service = InvoiceService::new(pool.get_ref().clone());
    let invoice = service
        .change_status(&path, request.status, calendar.today())
        .await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// Generate the installment schedule of a cash invoice
/// POST /invoices/{id}/financing
pub async fn finance_invoice(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    request: web::Json<FinancingTerms>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesWrite)?;

    let service = InvoiceService::new(pool.get_ref().clone());
    let (invoice, installments) = service
        .finance_invoice(&path, request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(FinancedInvoiceResponse {
        invoice: InvoiceResponse::from(invoice),
        installments,
    }))
}

/// Mark overdue installments and invoices
/// POST /cartera/overdue/refresh
pub async fn refresh_overdue(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesWrite)?;

    let service = InvoiceService::new(pool.get_ref().clone());
    let summary = service.refresh_overdue(calendar.today()).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Configure invoice routes
///
/// Registered as resources rather than a `/invoices` scope so the
/// installment and payment sub-resources can live in their own modules.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invoices")
            .route(web::post().to(create_invoice))
            .route(web::get().to(list_invoices)),
    )
    .service(web::resource("/invoices/{id}").route(web::get().to(get_invoice)))
    .service(web::resource("/invoices/{id}/status").route(web::post().to(change_invoice_status)))
    .service(web::resource("/invoices/{id}/financing").route(web::post().to(finance_invoice)))
    .service(web::resource("/cartera/overdue/refresh").route(web::post().to(refresh_overdue)));
}
