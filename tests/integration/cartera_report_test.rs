// Cartera report over a real database
//
// Deltas against a snapshot taken first, so leftovers from other runs on the
// shared database do not matter.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use erp_juridico::middleware::Permission;
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn send(
    srv: &TestServer,
    key: &str,
    method: &str,
    path: &str,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let request = match method {
        "GET" => srv.get(path),
        _ => srv.post(path),
    };
    let request = with_api_key(request, key);

    let mut response = match payload {
        Some(body) => request.send_json(&body).await,
        None => request.send().await,
    }
    .unwrap_or_else(|e| panic!("{} {} failed: {}", method, path, e));

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn report(srv: &TestServer, key: &str) -> Value {
    let path = format!("/reports/cartera?as_of={}", TestDataFactory::today());
    let (status, body) = send(srv, key, "GET", &path, None).await;
    assert_status(status, StatusCode::OK, &body);
    body
}

fn bucket_balance(report: &Value, label: &str) -> Decimal {
    report["aging"]
        .as_array()
        .and_then(|buckets| buckets.iter().find(|b| b["label"] == label))
        .map(|b| decimal_field(&b["balance"]))
        .unwrap_or_else(|| panic!("Missing aging bucket {}: {}", label, report))
}

fn status_count(report: &Value, status: &str) -> i64 {
    report["invoices_by_status"]
        .as_array()
        .and_then(|counts| counts.iter().find(|c| c["status"] == status))
        .and_then(|c| c["invoices"].as_i64())
        .unwrap_or_else(|| panic!("Missing status {}: {}", status, report))
}

#[actix_web::test]
#[ignore = "Requires test database configuration"]
async fn test_past_due_invoice_moves_cartera_and_annulment_removes_it() {
    let pool = create_test_pool().await;
    let key = seed_admin_key(&pool).await;
    let srv = spawn_test_server(pool.clone());

    let before = report(&srv, &key).await;
    assert_eq!(before["aging"].as_array().map(Vec::len), Some(4));

    let (status, invoice) = send(
        &srv,
        &key,
        "POST",
        "/invoices",
        Some(TestDataFactory::past_due_invoice_payload("730000", 95)),
    )
    .await;
    assert_status(status, StatusCode::CREATED, &invoice);
    let invoice_id = str_field(&invoice, "id").to_string();

    let during = report(&srv, &key).await;
    assert_eq!(
        decimal_field(&during["overdue"]) - decimal_field(&before["overdue"]),
        dec!(730000)
    );
    assert_eq!(
        bucket_balance(&during, "91+") - bucket_balance(&before, "91+"),
        dec!(730000)
    );
    assert_eq!(
        bucket_balance(&during, "1-30"),
        bucket_balance(&before, "1-30")
    );
    assert_eq!(
        decimal_field(&during["totals"]["outstanding"])
            - decimal_field(&before["totals"]["outstanding"]),
        dec!(730000)
    );
    assert_eq!(
        status_count(&during, "GENERADA") - status_count(&before, "GENERADA"),
        1
    );
    assert_eq!(
        during["overdue_invoices"].as_i64().unwrap_or_default()
            - before["overdue_invoices"].as_i64().unwrap_or_default(),
        1
    );

    let (status, annulled) = send(
        &srv,
        &key,
        "POST",
        &format!("/invoices/{}/status", invoice_id),
        Some(json!({ "status": "ANULADA" })),
    )
    .await;
    assert_status(status, StatusCode::OK, &annulled);
    assert_eq!(annulled["status"], "ANULADA");

    let after = report(&srv, &key).await;
    assert_eq!(decimal_field(&after["overdue"]), decimal_field(&before["overdue"]));
    assert_eq!(
        decimal_field(&after["totals"]["invoiced"]),
        decimal_field(&before["totals"]["invoiced"])
    );
    assert_eq!(
        decimal_field(&after["totals"]["outstanding"]),
        decimal_field(&before["totals"]["outstanding"])
    );
    assert_eq!(
        status_count(&after, "ANULADA") - status_count(&before, "ANULADA"),
        1
    );
}

#[actix_web::test]
#[ignore = "Requires test database configuration"]
async fn test_cartera_report_requires_reports_permission() {
    let pool = create_test_pool().await;
    let key = seed_api_key(&pool, "cajero", &[Permission::PaymentsWrite]).await;
    let srv = spawn_test_server(pool);

    let (status, body) = send(&srv, &key, "GET", "/reports/cartera", None).await;
    assert_status(status, StatusCode::FORBIDDEN, &body);
    assert_error_envelope(&body, 403);
}
