use actix_web::{web, HttpResponse};
use sqlx::MySqlPool;

use crate::core::{BusinessCalendar, Result};
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::payments::{models::RegisterPaymentRequest, services::PaymentService};

/// POST /invoices/{id}/payments
///
/// # Returns
/// - 201: Payment committed with its applications and the updated invoice
/// - 400: Invalid amount, closed invoice or rejected manual distribution
/// - 404: Invoice not found
pub async fn register_payment(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    path: web::Path<String>,
    request: web::Json<RegisterPaymentRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::PaymentsWrite)?;

    let service = PaymentService::new(pool.get_ref().clone());
    let receipt = service
        .register_payment(
            &path,
            request.into_inner(),
            calendar.today(),
            calendar.now_utc(),
        )
        .await?;

    Ok(HttpResponse::Created().json(receipt))
}

/// POST /invoices/{id}/payments/preview
pub async fn preview_payment(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<BusinessCalendar>,
    path: web::Path<String>,
    request: web::Json<RegisterPaymentRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::PaymentsWrite)?;

    let service = PaymentService::new(pool.get_ref().clone());
    let preview = service
        .preview_payment(&path, request.into_inner(), calendar.today())
        .await?;

    Ok(HttpResponse::Ok().json(preview))
}

/// GET /invoices/{id}/payments
pub async fn list_payments(
    user: AuthenticatedUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesRead)?;

    let service = PaymentService::new(pool.get_ref().clone());
    let payments = service.list_payments(&path).await?;

    Ok(HttpResponse::Ok().json(payments))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invoices/{id}/payments")
            .route(web::post().to(register_payment))
            .route(web::get().to(list_payments)),
    )
    .service(web::resource("/invoices/{id}/payments/preview").route(web::post().to(preview_payment)));
}
