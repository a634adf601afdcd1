// Response assertions shared by contract and integration tests

use actix_web::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Assert a status code, showing the body on mismatch
pub fn assert_status(actual: StatusCode, expected: StatusCode, body: &Value) {
    assert_eq!(
        actual,
        expected,
        "Expected {} {}, got {} {}; body: {}",
        expected.as_u16(),
        expected.canonical_reason().unwrap_or("Unknown"),
        actual.as_u16(),
        actual.canonical_reason().unwrap_or("Unknown"),
        body
    );
}

/// Assert the `{"error": {"code", "message"}}` envelope
pub fn assert_error_envelope(body: &Value, code: u16) {
    let error = body
        .get("error")
        .unwrap_or_else(|| panic!("Missing error object in {}", body));
    assert_eq!(error["code"].as_u64(), Some(code as u64), "body: {}", body);
    assert!(
        error["message"].as_str().map_or(false, |m| !m.is_empty()),
        "Missing error message in {}",
        body
    );
}

pub fn assert_json_field(body: &Value, field: &str) {
    assert!(
        body.get(field).is_some(),
        "Expected field '{}' in response: {}",
        field,
        body
    );
}

/// Read a money field whether it was serialized as a string or a number
pub fn decimal_field(value: &Value) -> Decimal {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Decimal::from_str(&raw).unwrap_or_else(|e| panic!("'{}' is not a decimal: {}", raw, e))
}

pub fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("Expected string field '{}' in {}", field, body))
}
