//! Status payload normalization.
//!
//! The status endpoint answers in several shapes. Each shape has its own
//! matcher; matchers run in order and the first one that recognises the
//! payload decides the [`TaskStatus`]. A payload nobody recognises is
//! treated as still generating.

use crate::{
    error::{GenerationError, Result},
    models::{SuccessFlag, TaskOutput, TaskStatus, SUCCESS_CODE},
};
use serde_json::Value;

type ShapeMatcher = fn(&Value) -> Option<Result<TaskStatus>>;

const MATCHERS: &[(&str, ShapeMatcher)] = &[
    ("nested", match_nested_envelope),
    ("flat", match_flat_envelope),
    ("status-string", match_status_string),
];

pub fn normalize_status(payload: &Value) -> Result<TaskStatus> {
    for (shape, matcher) in MATCHERS {
        if let Some(status) = matcher(payload) {
            log::trace!("Status payload matched {} shape", shape);
            return status;
        }
    }
    Ok(TaskStatus::Pending)
}

/// `{ code: 200, data: { successFlag, response, errorMessage } }`
pub fn match_nested_envelope(payload: &Value) -> Option<Result<TaskStatus>> {
    let ok = payload.get("code").and_then(Value::as_i64) == Some(SUCCESS_CODE);
    let has_data = payload.get("data").map_or(false, Value::is_object);
    (ok && has_data).then(|| read_envelope(payload))
}

/// `{ successFlag, response, errorMessage }` at the top level.
pub fn match_flat_envelope(payload: &Value) -> Option<Result<TaskStatus>> {
    payload
        .get("successFlag")
        .map(|_| read_envelope(payload))
}

/// `{ msg, data: { status: "completed" | "failed", imageUrl, imageUrls } }`
pub fn match_status_string(payload: &Value) -> Option<Result<TaskStatus>> {
    let data = payload.get("data").filter(|d| d.is_object())?;
    match data.get("status").and_then(Value::as_str)? {
        "completed" => Some(Ok(TaskStatus::Succeeded(TaskOutput {
            result_image_url: non_empty_str(data.get("imageUrl")),
            result_image_urls: string_list(data.get("imageUrls")),
        }))),
        "failed" => Some(Ok(TaskStatus::GenerationFailed(non_empty_str(
            payload.get("msg"),
        )))),
        _ => None,
    }
}

/// Reads envelope fields from `data` first, then from the top level.
fn read_envelope(payload: &Value) -> Result<TaskStatus> {
    let field = |name: &str| envelope_field(payload, name);

    let flag = field("successFlag")
        .and_then(flag_code)
        .and_then(SuccessFlag::from_code)
        .ok_or_else(|| GenerationError::TransportError("Unknown task status".into()))?;

    let status = match flag {
        SuccessFlag::Generating => TaskStatus::Pending,
        SuccessFlag::Completed => {
            let response = field("response");
            TaskStatus::Succeeded(TaskOutput {
                result_image_url: non_empty_str(response.and_then(|r| r.get("resultImageUrl"))),
                result_image_urls: string_list(response.and_then(|r| r.get("resultImageUrls"))),
            })
        }
        SuccessFlag::CreateFailed => TaskStatus::CreateFailed(non_empty_str(field("errorMessage"))),
        SuccessFlag::GenerateFailed => {
            TaskStatus::GenerationFailed(non_empty_str(field("errorMessage")))
        }
    };
    Ok(status)
}

/// Flags may arrive as integral floats (`1.0`).
fn flag_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn envelope_field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload
        .get("data")
        .and_then(|data| data.get(name))
        .filter(|v| !v.is_null())
        .or_else(|| payload.get(name).filter(|v| !v.is_null()))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Best available error text from a non-OK body: `message`, `error`, `msg`.
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| non_empty_str(body.get(*key)))
}
