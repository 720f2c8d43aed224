use serde::{Deserialize, Serialize};

/// Request kind sent on the wire. The upstream API has only ever been
/// verified with this spelling.
pub const TEXT_TO_IMAGE: &str = "TEXTTOIAMGE";
/// Correctly spelled variant; not sent until the API confirms it is accepted.
pub const TEXT_TO_IMAGE_CORRECTED: &str = "TEXTTOIMAGE";

pub const SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskBody {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub num_images: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTaskResponse {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub data: Option<SubmitTaskData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskData {
    pub task_id: Option<String>,
}

/// `successFlag` values reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessFlag {
    Generating = 0,
    Completed = 1,
    CreateFailed = 2,
    GenerateFailed = 3,
}

impl SuccessFlag {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SuccessFlag::Generating),
            1 => Some(SuccessFlag::Completed),
            2 => Some(SuccessFlag::CreateFailed),
            3 => Some(SuccessFlag::GenerateFailed),
            _ => None,
        }
    }
}
