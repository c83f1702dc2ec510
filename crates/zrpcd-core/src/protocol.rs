//! JSON-RPC 2.0 wire types for the daemon's stdio boundary (§3 Data Model).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A request line as received from stdin. `id` is always present and
/// integral; notifications-from-client are not supported.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: i64,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A response line, success or failure, serialized by the output serializer.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<i64>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn failure_with_data(
        id: Option<i64>,
        code: i64,
        message: impl Into<String>,
        data: Option<String>,
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// A server-to-client notification: `receiveStream`, `sendStream`, or
/// `updateProgress` (§3 Notification).
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

pub const METHOD_RECEIVE_STREAM: &str = "receiveStream";
pub const METHOD_SEND_STREAM: &str = "sendStream";
pub const METHOD_UPDATE_PROGRESS: &str = "updateProgress";

impl Notification {
    pub fn receive_stream(stream_id: u64, pipe_path: &str, content_len: Option<u64>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: METHOD_RECEIVE_STREAM,
            params: serde_json::json!({
                "id": stream_id,
                "pipePath": pipe_path,
                "contentLen": content_len,
            }),
        }
    }

    pub fn send_stream(stream_id: u64, pipe_path: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            method: METHOD_SEND_STREAM,
            params: serde_json::json!({ "id": stream_id, "pipePath": pipe_path }),
        }
    }

    pub fn update_progress(stream_id: u64, progress: i32) -> Self {
        Self {
            jsonrpc: "2.0",
            method: METHOD_UPDATE_PROGRESS,
            params: serde_json::json!({ "id": stream_id, "progress": progress }),
        }
    }
}

/// The readiness banner: the first stdout line, emitted once startup
/// completes successfully (§3 Readiness banner).
#[derive(Debug, Clone, Serialize)]
pub struct ReadyBanner {
    pub status: &'static str,
    pub message: String,
    pub data: ReadyBannerData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadyBannerData {
    pub checksums: Option<BTreeMap<String, String>>,
}

impl ReadyBanner {
    pub fn new(num_workers: usize, checksums: Option<BTreeMap<String, String>>) -> Self {
        Self {
            status: "ready",
            message: format!("daemon ready with {num_workers} worker(s)"),
            data: ReadyBannerData { checksums },
        }
    }
}

/// JSON-RPC / daemon error codes (§7 Error handling design).
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const GENERIC_HANDLER_FAILURE: i64 = 1;
}

/// The closed catalog of method names (§6 External interfaces, Methods).
pub mod methods {
    pub const LIST_DATASETS: &str = "listDatasets";
    pub const LIST_DS_MEMBERS: &str = "listDsMembers";
    pub const READ_DATASET: &str = "readDataset";
    pub const WRITE_DATASET: &str = "writeDataset";
    pub const CREATE_DATASET: &str = "createDataset";
    pub const CREATE_MEMBER: &str = "createMember";
    pub const DELETE_DATASET: &str = "deleteDataset";
    pub const RESTORE_DATASET: &str = "restoreDataset";

    pub const LIST_FILES: &str = "listFiles";
    pub const READ_FILE: &str = "readFile";
    pub const WRITE_FILE: &str = "writeFile";
    pub const CREATE_FILE: &str = "createFile";
    pub const DELETE_FILE: &str = "deleteFile";
    pub const CHOWN_FILE: &str = "chownFile";
    pub const CHMOD_FILE: &str = "chmodFile";
    pub const CHTAG_FILE: &str = "chtagFile";

    pub const LIST_JOBS: &str = "listJobs";
    pub const LIST_SPOOLS: &str = "listSpools";
    pub const READ_SPOOL: &str = "readSpool";
    pub const GET_JCL: &str = "getJcl";
    pub const GET_JOB_STATUS: &str = "getJobStatus";
    pub const SUBMIT_JOB: &str = "submitJob";
    pub const SUBMIT_JCL: &str = "submitJcl";
    pub const SUBMIT_USS: &str = "submitUss";
    pub const CANCEL_JOB: &str = "cancelJob";
    pub const DELETE_JOB: &str = "deleteJob";
    pub const HOLD_JOB: &str = "holdJob";
    pub const RELEASE_JOB: &str = "releaseJob";

    pub const CONSOLE_COMMAND: &str = "consoleCommand";

    pub const ALL: &[&str] = &[
        LIST_DATASETS,
        LIST_DS_MEMBERS,
        READ_DATASET,
        WRITE_DATASET,
        CREATE_DATASET,
        CREATE_MEMBER,
        DELETE_DATASET,
        RESTORE_DATASET,
        LIST_FILES,
        READ_FILE,
        WRITE_FILE,
        CREATE_FILE,
        DELETE_FILE,
        CHOWN_FILE,
        CHMOD_FILE,
        CHTAG_FILE,
        LIST_JOBS,
        LIST_SPOOLS,
        READ_SPOOL,
        GET_JCL,
        GET_JOB_STATUS,
        SUBMIT_JOB,
        SUBMIT_JCL,
        SUBMIT_USS,
        CANCEL_JOB,
        DELETE_JOB,
        HOLD_JOB,
        RELEASE_JOB,
        CONSOLE_COMMAND,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_has_no_error_field() {
        let resp = Response::success(7, serde_json::json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn failure_response_has_no_result_field() {
        let resp = Response::failure(Some(7), error_codes::METHOD_NOT_FOUND, "Unrecognized command noSuchMethod");
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
    }

    #[test]
    fn parse_failure_response_has_null_id() {
        let resp = Response::failure(None, error_codes::PARSE_ERROR, "Failed to parse command request: boom");
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value["id"].is_null());
    }
}
