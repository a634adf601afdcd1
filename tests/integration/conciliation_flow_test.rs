// Conciliation acceptance cascade over a real database
//
// Accepting opens the legal case, bills the fee and (optionally) finances it
// in one transaction; a failing acceptance leaves nothing behind.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn post(srv: &TestServer, key: &str, path: &str, payload: Value) -> (StatusCode, Value) {
    let mut response = with_api_key(srv.post(path), key)
        .send_json(&payload)
        .await
        .unwrap_or_else(|e| panic!("POST {} failed: {}", path, e));
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn get(srv: &TestServer, key: &str, path: &str) -> (StatusCode, Value) {
    let mut response = with_api_key(srv.get(path), key)
        .send()
        .await
        .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e));
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[actix_web::test]
#[ignore = "Requires test database configuration"]
async fn test_accepting_conciliation_opens_case_and_bills_fee() {
    let pool = create_test_pool().await;
    let key = seed_admin_key(&pool).await;
    let srv = spawn_test_server(pool.clone());

    let (status, conciliation) =
        post(&srv, &key, "/conciliations", TestDataFactory::conciliation_payload("2400000")).await;
    assert_status(status, StatusCode::CREATED, &conciliation);
    assert_eq!(conciliation["status"], "PROGRAMADA");
    let id = str_field(&conciliation, "id").to_string();

    let (status, started) = post(&srv, &key, &format!("/conciliations/{}/start", id), json!({})).await;
    assert_status(status, StatusCode::OK, &started);
    assert_eq!(started["status"], "EN_CURSO");

    let (status, outcome) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/accept", id),
        TestDataFactory::acceptance_payload(Some(TestDataFactory::financing_payload(6, "0.015", 30))),
    )
    .await;
    assert_status(status, StatusCode::OK, &outcome);

    let case_id = str_field(&outcome["case"], "id").to_string();
    let invoice_id = str_field(&outcome["invoice"], "id").to_string();
    assert_eq!(outcome["conciliation"]["status"], "ACEPTADA");
    assert_eq!(outcome["case"]["status"], "ABIERTO");
    assert_eq!(outcome["case"]["conciliation_id"], id.as_str());
    assert_eq!(outcome["invoice"]["case_id"], case_id.as_str());
    assert_eq!(outcome["invoice"]["modality"], "FINANCIADO");
    assert_eq!(decimal_field(&outcome["invoice"]["total"]), dec!(2400000));
    assert_eq!(outcome["installments"].as_array().map(Vec::len), Some(6));

    let (_, stored) = get(&srv, &key, &format!("/conciliations/{}", id)).await;
    assert_eq!(stored["case_id"], case_id.as_str());
    assert_eq!(stored["invoice_id"], invoice_id.as_str());

    let (status, installments) = get(&srv, &key, &format!("/invoices/{}/installments", invoice_id)).await;
    assert_status(status, StatusCode::OK, &installments);
    assert_eq!(installments["installments"].as_array().map(Vec::len), Some(6));

    // Terminal: a second acceptance is rejected and creates nothing
    let (status, body) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/accept", id),
        TestDataFactory::acceptance_payload(None),
    )
    .await;
    assert_status(status, StatusCode::BAD_REQUEST, &body);
    assert_eq!(
        count_rows(&pool, "SELECT COUNT(*) FROM legal_cases WHERE conciliation_id = ?", &id).await,
        1
    );
}

#[actix_web::test]
#[ignore = "Requires test database configuration"]
async fn test_failed_acceptance_rolls_back() {
    let pool = create_test_pool().await;
    let key = seed_admin_key(&pool).await;
    let srv = spawn_test_server(pool.clone());

    let (_, conciliation) =
        post(&srv, &key, "/conciliations", TestDataFactory::conciliation_payload("900000")).await;
    let id = str_field(&conciliation, "id").to_string();

    // One installment is out of range; the case must not survive
    let (status, body) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/accept", id),
        TestDataFactory::acceptance_payload(Some(TestDataFactory::financing_payload(1, "0", 30))),
    )
    .await;
    assert_status(status, StatusCode::BAD_REQUEST, &body);

    let (_, stored) = get(&srv, &key, &format!("/conciliations/{}", id)).await;
    assert_eq!(stored["status"], "PROGRAMADA");
    assert!(stored["case_id"].is_null());
    assert_eq!(
        count_rows(&pool, "SELECT COUNT(*) FROM legal_cases WHERE conciliation_id = ?", &id).await,
        0
    );

    // Cash acceptance afterwards succeeds
    let (status, outcome) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/accept", id),
        TestDataFactory::acceptance_payload(None),
    )
    .await;
    assert_status(status, StatusCode::OK, &outcome);
    assert_eq!(outcome["invoice"]["modality"], "CONTADO");
    assert_eq!(outcome["installments"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
#[ignore = "Requires test database configuration"]
async fn test_rejected_conciliation_is_terminal() {
    let pool = create_test_pool().await;
    let key = seed_admin_key(&pool).await;
    let srv = spawn_test_server(pool.clone());

    let (_, conciliation) =
        post(&srv, &key, "/conciliations", TestDataFactory::conciliation_payload("500000")).await;
    let id = str_field(&conciliation, "id").to_string();

    let (status, rejected) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/reject", id),
        json!({ "notes": "El acreedor mayoritario no asistió" }),
    )
    .await;
    assert_status(status, StatusCode::OK, &rejected);
    assert_eq!(rejected["status"], "RECHAZADA");
    assert_eq!(rejected["notes"], "El acreedor mayoritario no asistió");

    let (status, _) = post(
        &srv,
        &key,
        &format!("/conciliations/{}/accept", id),
        TestDataFactory::acceptance_payload(None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&srv, &key, &format!("/conciliations/{}/desist", id), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
