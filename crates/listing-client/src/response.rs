use listing_core::ServiceError;
use serde_json::Value;

const SNIPPET_CHARS: usize = 160;

pub(crate) fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.trim().chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

/// Turn a non-success response into [`ServiceError::HttpStatus`].
pub(crate) async fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body_snippet = response
        .text()
        .await
        .ok()
        .map(|body| response_snippet(&body, SNIPPET_CHARS))
        .unwrap_or_default();
    log::warn!("{operation} failed with HTTP {status}");

    Err(ServiceError::HttpStatus {
        operation,
        status: status.as_u16(),
        body_snippet,
    })
}

/// The version document, whether or not the service wrapped it in `data`.
pub(crate) fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if !map.contains_key("versionId") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Error messages the service reports in an otherwise successful response.
pub(crate) fn rejection_messages(body: &Value) -> Vec<String> {
    let errors = body
        .pointer("/messages/error")
        .or_else(|| body.pointer("/data/sectionErrorKeys"))
        .and_then(Value::as_array);

    errors
        .into_iter()
        .flatten()
        .filter_map(|message| match message {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}
