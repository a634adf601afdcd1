use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::core::Result;
use crate::middleware::{AuthenticatedUser, Permission};
use crate::modules::installments::{
    models::{FinancingTerms, Installment},
    services::InstallmentService,
};

/// Response for GET /invoices/{id}/installments
#[derive(Debug, Serialize)]
pub struct GetInstallmentsResponse {
    pub invoice_id: String,
    pub installments: Vec<Installment>,
}

/// Request for POST /amortization/quote
#[derive(Debug, Deserialize)]
pub struct AmortizationQuoteRequest {
    pub principal: Decimal,
    pub installment_count: i32,
    #[serde(default)]
    pub monthly_interest_rate: Decimal,
    pub first_due_date: NaiveDate,
}

impl AmortizationQuoteRequest {
    fn terms(&self) -> FinancingTerms {
        FinancingTerms {
            installment_count: self.installment_count,
            monthly_interest_rate: self.monthly_interest_rate,
            first_due_date: self.first_due_date,
        }
    }
}

/// GET /invoices/{invoice_id}/installments
///
/// # Returns
/// - 200: Installment schedule (empty for cash invoices)
/// - 404: Invoice not found
pub async fn get_installments(
    user: AuthenticatedUser,
    invoice_id: web::Path<String>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesRead)?;

    let service = InstallmentService::new(pool.get_ref().clone());
    let installments = service.get_installments(&invoice_id).await?;

    Ok(HttpResponse::Ok().json(GetInstallmentsResponse {
        invoice_id: invoice_id.into_inner(),
        installments,
    }))
}

/// POST /amortization/quote
///
/// French amortization table for a principal, without touching the database.
pub async fn quote_amortization(
    user: AuthenticatedUser,
    request: web::Json<AmortizationQuoteRequest>,
) -> Result<HttpResponse> {
    user.require(Permission::InvoicesRead)?;

    let schedule = InstallmentService::quote(request.principal, &request.terms())?;

    Ok(HttpResponse::Ok().json(schedule))
}

/// Configure installment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invoices/{invoice_id}/installments").route(web::get().to(get_installments)),
    )
    .service(web::resource("/amortization/quote").route(web::post().to(quote_amortization)));
}
