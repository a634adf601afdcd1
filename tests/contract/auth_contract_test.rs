// Authentication and permission contract
//
// 401 without a usable API key, 403 when the key lacks the permission.
// None of these requests reach the database.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test, web, App};
use erp_juridico::middleware::{ApiKeyAuth, Permission, API_KEY_HEADER};
use helpers::*;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_missing_api_key_returns_401() {
    let pool = lazy_pool();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(ApiKeyAuth::new(pool))
            .configure(erp_juridico::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/invoices").to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_status(status, StatusCode::UNAUTHORIZED, &body);
    assert_error_envelope(&body, 401);
}

#[actix_web::test]
async fn test_malformed_api_key_returns_401() {
    let pool = lazy_pool();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(ApiKeyAuth::new(pool))
            .configure(erp_juridico::configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/reports/cartera")
        .insert_header((API_KEY_HEADER, "no-separator"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_health_is_public() {
    let pool = lazy_pool();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(ApiKeyAuth::new(pool))
            .configure(erp_juridico::configure_routes),
    )
    .await;

    for uri in ["/health", "/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[actix_web::test]
async fn test_handler_without_authenticated_user_returns_401() {
    let app = test::init_service(contract_app(lazy_pool(), None)).await;

    let req = test::TestRequest::post()
        .uri("/amortization/quote")
        .set_json(json!({
            "principal": "1000000",
            "installment_count": 12,
            "first_due_date": "2025-09-01",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_missing_permission_returns_403() {
    let cashier = test_user("cajero", &[Permission::InvoicesRead, Permission::PaymentsWrite]);
    let app = test::init_service(contract_app(lazy_pool(), Some(cashier))).await;

    let cases = vec![
        test::TestRequest::get().uri("/reports/cartera").to_request(),
        test::TestRequest::get().uri("/conciliations").to_request(),
        test::TestRequest::post()
            .uri("/invoices")
            .set_json(json!({
                "client_name": "Ana Ruiz",
                "client_document": "CC 1",
                "concept": "Honorarios",
                "total": "100000",
                "due_date": "2025-12-31",
            }))
            .to_request(),
        test::TestRequest::post()
            .uri("/cases/any-id/status")
            .set_json(json!({ "status": "CERRADO" }))
            .to_request(),
    ];

    for req in cases {
        let path = req.path().to_string();
        let resp = test::call_service(&app, req).await;

        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}: {}", path, body);
        assert_error_envelope(&body, 403);
    }
}

#[actix_web::test]
async fn test_granted_permission_reaches_handler() {
    let advisor = test_user("asesor", &[Permission::InvoicesRead]);
    let app = test::init_service(contract_app(lazy_pool(), Some(advisor))).await;

    let req = test::TestRequest::post()
        .uri("/amortization/quote")
        .set_json(json!({
            "principal": "1000000",
            "installment_count": 12,
            "monthly_interest_rate": "0.02",
            "first_due_date": "2025-09-01",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_status(status, StatusCode::OK, &body);
    assert_eq!(body["rows"].as_array().map(Vec::len), Some(12));
}
