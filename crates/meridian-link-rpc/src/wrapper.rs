//! Response wrapping for frontend compatibility.
//!
//! The settings screen expects object responses in the form
//! `{success: bool, ...data}`. Plain scalar answers are passed through.

use serde_json::{json, Value};

/// Wrap handler results for the frontend.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        "get_link_status" | "install_link" => add_success_field(result),

        // Bool answers and health checks are returned as-is
        _ => result,
    }
}

fn add_success_field(result: Value) -> Value {
    match result {
        Value::Object(mut map) => {
            map.entry("success").or_insert(json!(true));
            Value::Object(map)
        }
        Value::Null => json!({"success": true}),
        other => json!({"success": true, "result": other}),
    }
}
