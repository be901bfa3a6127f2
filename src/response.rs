//! Decoding of raw Salt API responses.

use crate::{Error, Result};
use reqwest::StatusCode;
use serde_json::{Map, Value};

/// Decode the body of a Salt API response.
///
/// Non-200 statuses are reported as [`Error::HttpStatus`] with the raw body
/// text attached; the Salt API may return HTML error pages even when asked
/// for JSON, so no decode is attempted on that path.
pub(crate) async fn decode_api_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    // An unreadable body on the error path degrades to a bare status error.
    let body = response.text().await.unwrap_or_default();
    decode_body(status, &body)
}

/// Pure decoding step, split out so classification is testable without a
/// socket.
pub(crate) fn decode_body(status: StatusCode, body: &str) -> Result<Value> {
    if status != StatusCode::OK {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    let decoded: Map<String, Value> =
        serde_json::from_str(body).map_err(|source| Error::ResponseDecode { source })?;
    Ok(Value::Object(decoded))
}
