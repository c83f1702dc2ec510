//! Result/param shapes for the method catalog (§6), grounded in
//! `original_source/native/golang/types/{common,ds,uss,jobs}` and the
//! binding resolutions in `SPEC_FULL.md` §9.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub name: String,
    pub dsorg: String,
    pub volser: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsMember {
    pub name: String,
}

/// Authoritative over the legacy `isDir: bool` field per the resolved open
/// question: the six-variant form distinguishes symlinks, FIFOs, sockets,
/// and character devices instead of collapsing everything to file/dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UssFileType {
    File,
    Directory,
    Symlink,
    Fifo,
    Socket,
    CharDevice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: UssFileType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub retcode: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spool {
    pub id: i64,
    pub dd_name: String,
    pub step_name: String,
    pub ds_name: String,
    pub proc_step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobStatusResponse {
    pub job: Job,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileResponse {
    pub success: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub success: bool,
    pub path: String,
}
