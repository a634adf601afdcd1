// Request validation contract
//
// Malformed or invalid input is rejected with 400 and the error envelope
// before any database work.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test};
use erp_juridico::middleware::Permission;
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn clerk() -> erp_juridico::middleware::AuthenticatedUser {
    test_user("admin", &[])
}

async fn post_json(uri: &str, payload: Value) -> (StatusCode, Value) {
    let app = test::init_service(contract_app(lazy_pool(), Some(clerk()))).await;
    let req = test::TestRequest::post().uri(uri).set_json(payload).to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn test_malformed_json_returns_400() {
    let app = test::init_service(contract_app(lazy_pool(), Some(clerk()))).await;

    let req = test::TestRequest::post()
        .uri("/invoices")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"client_name\": \"Ana\", ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_status(status, StatusCode::BAD_REQUEST, &body);
    assert_error_envelope(&body, 400);
}

#[actix_web::test]
async fn test_unknown_enum_value_returns_400() {
    let (status, body) = post_json(
        "/invoices/some-id/payments",
        json!({ "amount": "1000", "method": "BITCOIN" }),
    )
    .await;

    assert_status(status, StatusCode::BAD_REQUEST, &body);
}

#[actix_web::test]
async fn test_invalid_query_returns_400() {
    let app = test::init_service(contract_app(
        lazy_pool(),
        Some(test_user("auditor", &[Permission::InvoicesRead])),
    ))
    .await;

    let req = test::TestRequest::get().uri("/invoices?limit=many").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_non_positive_invoice_total_returns_400() {
    let (status, body) = post_json(
        "/invoices",
        json!({
            "client_name": "Ana Ruiz",
            "client_document": "CC 1",
            "concept": "Honorarios",
            "total": "-5",
            "due_date": "2025-12-31",
        }),
    )
    .await;

    assert_status(status, StatusCode::BAD_REQUEST, &body);
    assert_error_envelope(&body, 400);
}

#[actix_web::test]
async fn test_payment_with_three_decimals_returns_400() {
    let (status, body) = post_json(
        "/invoices/some-id/payments",
        json!({ "amount": "100.005", "method": "EFECTIVO" }),
    )
    .await;

    assert_status(status, StatusCode::BAD_REQUEST, &body);
}

#[actix_web::test]
async fn test_manual_payment_without_allocations_returns_400() {
    let (status, body) = post_json(
        "/invoices/some-id/payments/preview",
        json!({ "amount": "1000", "method": "EFECTIVO", "mode": "MANUAL", "allocations": [] }),
    )
    .await;

    assert_status(status, StatusCode::BAD_REQUEST, &body);
}

#[actix_web::test]
async fn test_quote_rejects_out_of_range_terms() {
    for count in [1, 61] {
        let (status, body) = post_json(
            "/amortization/quote",
            json!({
                "principal": "1000000",
                "installment_count": count,
                "first_due_date": "2025-09-01",
            }),
        )
        .await;

        assert_status(status, StatusCode::BAD_REQUEST, &body);
    }
}

#[actix_web::test]
async fn test_quote_returns_french_schedule() {
    let (status, body) = post_json(
        "/amortization/quote",
        json!({
            "principal": "1000000",
            "installment_count": 12,
            "monthly_interest_rate": "0.02",
            "first_due_date": "2025-09-01",
        }),
    )
    .await;

    assert_status(status, StatusCode::OK, &body);
    assert_eq!(decimal_field(&body["installment_value"]), dec!(94559.60));
    assert_eq!(str_field(&body["rows"][1], "due_date"), "2025-10-01");
}
