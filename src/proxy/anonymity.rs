//! Anonymity grading from an echo response

use crate::proxy::models::AnonymityLevel;
use crate::proxy::probe::ProbeResponse;
use reqwest::header::VIA;
use serde_json::Value;

/// Header disclosing the original client address
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Echo body field carrying the caller's apparent address
const ORIGIN_FIELD: &str = "origin";

/// Grade how much of the client's identity a proxy leaks.
///
/// Forwarding or hop-trace headers make a proxy transparent; otherwise a
/// non-empty `origin` in the JSON body makes it anonymous, and elite if
/// neither is present. A body that is not a JSON object grades `Unknown`.
pub fn evaluate(response: &ProbeResponse) -> AnonymityLevel {
    let headers = &response.headers;
    if headers.contains_key(FORWARDED_FOR) || headers.contains_key(VIA) {
        return AnonymityLevel::Transparent;
    }

    let body: Value = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(_) => return AnonymityLevel::Unknown,
    };

    let Some(fields) = body.as_object() else {
        return AnonymityLevel::Unknown;
    };

    if fields.get(ORIGIN_FIELD).is_some_and(is_truthy) {
        AnonymityLevel::Anonymous
    } else {
        AnonymityLevel::Elite
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
