//! Reason extraction from error response bodies

use serde_json::Value;

/// Reason shown when a failed chat request carries no usable message.
pub const GENERIC_SEND_FAILURE: &str = "Failed to send message";

/// Pull a human-readable reason out of a non-2xx response body.
///
/// Checked in order: `error.message`, `detail.message`, then a plain string
/// `error` or `detail`. Returns `None` for bodies that are not JSON or carry
/// none of these.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let nested = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
    };
    let plain = |key: &str| value.get(key).and_then(Value::as_str);

    nested("error")
        .or_else(|| nested("detail"))
        .or_else(|| plain("error"))
        .or_else(|| plain("detail"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
