//! Provider completion webhook payloads and parser.
//!
//! Kie AI posts `{"code": 200, "msg": "...", "data": {...}}` to the callback
//! URL given at job creation. The body is untrusted: every field is
//! optional here and [`parse_callback`] decides what it means.

use serde::Deserialize;
use soraclean_core::task::TaskOutcome;

use crate::api::CODE_OK;

/// Failure message used when the provider sends none.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Processing failed";

/// Failure message used when a success callback carries no usable result.
pub const MISSING_RESULT_MESSAGE: &str = "Provider returned no result";

const STATE_SUCCESS: &str = "success";
const STATE_FAIL: &str = "fail";

/// Raw webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<CallbackData>,
}

/// The `data` object of a webhook body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackData {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Usually a JSON document encoded as a string, e.g.
    /// `"{\"resultUrls\":[\"https://...\"]}"`.
    #[serde(default)]
    pub result_json: Option<serde_json::Value>,
    #[serde(default)]
    pub fail_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultJson {
    #[serde(default)]
    result_urls: Vec<String>,
}

/// What a structurally valid callback asks us to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// The job finished.
    Terminal(TaskOutcome),
    /// A progress notification; nothing to record.
    InProgress { state: Option<String> },
}

/// A validated callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCallback {
    pub task_id: String,
    pub event: CallbackEvent,
}

/// Reasons a callback body is rejected outright.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Invalid callback payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No taskId provided")]
    MissingTaskId,
}

/// Parse and interpret a raw webhook body.
pub fn parse_callback(body: &[u8]) -> Result<ParsedCallback, CallbackError> {
    let payload: CallbackPayload = serde_json::from_slice(body)?;
    interpret(payload)
}

/// Interpret an already-decoded payload.
pub fn interpret(payload: CallbackPayload) -> Result<ParsedCallback, CallbackError> {
    let data = payload.data.ok_or(CallbackError::MissingTaskId)?;
    let task_id = data
        .task_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(CallbackError::MissingTaskId)?
        .to_string();

    // A missing code is not treated as a rejection; only an explicit
    // non-200 code is.
    let code_ok = payload.code.map_or(true, |code| code == CODE_OK);
    let state = data.state.as_deref();

    let event = if code_ok && state == Some(STATE_SUCCESS) {
        let outcome = match first_result_url(data.result_json.as_ref()) {
            Some(result_url) => TaskOutcome::Success { result_url },
            None => TaskOutcome::Failure {
                message: MISSING_RESULT_MESSAGE.to_string(),
            },
        };
        CallbackEvent::Terminal(outcome)
    } else if state == Some(STATE_FAIL) || !code_ok {
        let message = data
            .fail_msg
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
        CallbackEvent::Terminal(TaskOutcome::Failure { message })
    } else {
        CallbackEvent::InProgress { state: data.state }
    };

    Ok(ParsedCallback { task_id, event })
}

/// Extract `resultUrls[0]` from `resultJson`, accepting either the encoded
/// string form or an inline object.
fn first_result_url(result_json: Option<&serde_json::Value>) -> Option<String> {
    let parsed: ResultJson = match result_json? {
        serde_json::Value::String(encoded) => serde_json::from_str(encoded).ok()?,
        value @ serde_json::Value::Object(_) => serde_json::from_value(value.clone()).ok()?,
        _ => return None,
    };
    parsed.result_urls.into_iter().next().filter(|url| !url.is_empty())
}
