//! ERP Jurídico cartera service
//!
//! Invoices for legal fees, French-system installment plans, payment
//! allocation over installments, conciliations that open legal cases, and
//! cartera reporting, served over HTTP/JSON.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

use actix_web::{web, HttpResponse};

pub use modules::{cases, conciliations, installments, invoices, payments, reports};

/// Register every HTTP route of the service
///
/// Middleware and shared `app_data` (pool, business calendar) are set up by the caller.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .configure(modules::health::configure)
        .configure(modules::invoices::configure)
        .configure(modules::installments::configure)
        .configure(modules::payments::configure)
        .configure(modules::conciliations::configure)
        .configure(modules::cases::configure)
        .configure(modules::reports::configure);
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "ERP Jurídico",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
