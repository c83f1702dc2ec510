//! Job operations (§6): `listJobs`, `listSpools`, `readSpool`, `getJcl`,
//! `getJobStatus`, `submitJob`, `submitJcl`, `submitUss`, `cancelJob`,
//! `deleteJob`, `holdJob`, `releaseJob`. Argv shapes grounded in
//! `original_source/native/golang/cmds/jobs.go`; `submitUss`/`holdJob`/
//! `releaseJob` have no original-source counterpart and follow the same
//! `job <verb> <jobId>` shape as their siblings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zrpcd_core::{HandlerContext, HandlerFuture};

use crate::exec::{csv_rows, exec_argv, exec_argv_with_stdin, exec_streamed, StreamDirection};
use crate::types::{GetJobStatusResponse, Job, Spool};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListJobsParams {
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListJobsResponse {
    items: Vec<Job>,
}

pub fn list_jobs<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ListJobsParams = serde_json::from_value(params)?;
        let mut argv = vec!["job".to_string(), "list".to_string(), "--rfc".to_string(), "true".to_string()];
        if let Some(owner) = params.owner {
            argv.extend(["--owner".to_string(), owner]);
        }
        let stdout = exec_argv(ctx, &argv).await?;
        let items = csv_rows(&stdout)
            .into_iter()
            .filter(|row| row.len() >= 4)
            .map(|row| Job {
                id: row[0].clone(),
                retcode: row[1].clone(),
                name: row[2].clone(),
                status: row[3].clone(),
            })
            .collect();
        Ok(serde_json::to_value(ListJobsResponse { items })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobIdParams {
    job_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSpoolsResponse {
    items: Vec<Spool>,
}

pub fn list_spools<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        let argv = vec!["job".to_string(), "list-files".to_string(), params.job_id, "--rfc".to_string(), "true".to_string()];
        let stdout = exec_argv(ctx, &argv).await?;
        let items = csv_rows(&stdout)
            .into_iter()
            .filter(|row| row.len() >= 5)
            .filter_map(|row| {
                Some(Spool {
                    id: row[2].parse().ok()?,
                    dd_name: row[0].clone(),
                    ds_name: row[1].clone(),
                    step_name: row[3].clone(),
                    proc_step: row[4].clone(),
                })
            })
            .collect();
        Ok(serde_json::to_value(ListSpoolsResponse { items })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadSpoolParams {
    job_id: String,
    dsn_key: i64,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    stream_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadSpoolResponse {
    encoding: Option<String>,
    job_id: String,
    dsn_key: i64,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<BTreeMap<String, String>>,
}

pub fn read_spool<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ReadSpoolParams = serde_json::from_value(params)?;
        let mut argv = vec![
            "job".to_string(),
            "view-file".to_string(),
            params.job_id.clone(),
            params.dsn_key.to_string(),
        ];
        if let Some(encoding) = &params.encoding {
            argv.extend(["--encoding".to_string(), encoding.clone(), "--rfb".to_string(), "true".to_string()]);
        }

        if params.stream_id != 0 {
            let metadata = exec_streamed(ctx, argv, params.stream_id, StreamDirection::Receive).await?;
            return Ok(serde_json::to_value(ReadSpoolResponse {
                encoding: params.encoding,
                job_id: params.job_id,
                dsn_key: params.dsn_key,
                data: String::new(),
                metadata: Some(metadata),
            })?);
        }

        let data = exec_argv(ctx, &argv).await?;
        Ok(serde_json::to_value(ReadSpoolResponse {
            encoding: params.encoding,
            job_id: params.job_id,
            dsn_key: params.dsn_key,
            data,
            metadata: None,
        })?)
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetJclResponse {
    job_id: String,
    data: String,
}

pub fn get_jcl<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        let data = exec_argv(ctx, &["job".to_string(), "view-jcl".to_string(), params.job_id.clone()]).await?;
        Ok(serde_json::to_value(GetJclResponse { job_id: params.job_id, data })?)
    })
}

/// Returns a single `Job` via `GetJobStatusResponse`, not a list (resolved
/// open question #1).
pub fn get_job_status<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        let stdout = exec_argv(ctx, &["job".to_string(), "view-status".to_string(), params.job_id.clone(), "--rfc".to_string(), "true".to_string()]).await?;
        let row = csv_rows(&stdout).into_iter().next().filter(|row| row.len() >= 4);
        let Some(row) = row else {
            return Err(zrpcd_core::HandlerError::generic(format!(
                "Missing job properties for {}",
                params.job_id
            )));
        };
        let job = Job {
            id: row[0].clone(),
            retcode: row[1].clone(),
            name: row[2].clone(),
            status: row[3].clone(),
        };
        Ok(serde_json::to_value(GetJobStatusResponse { job })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobParams {
    dsname: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobResponse {
    success: bool,
    dsname: String,
    job_id: String,
}

pub fn submit_job<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: SubmitJobParams = serde_json::from_value(params)?;
        let stdout = exec_argv(ctx, &["job".to_string(), "submit".to_string(), params.dsname.clone(), "--only-jobid".to_string(), "true".to_string()]).await?;
        Ok(serde_json::to_value(SubmitJobResponse {
            success: true,
            dsname: params.dsname,
            job_id: stdout.trim().to_string(),
        })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJclParams {
    jcl: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJclResponse {
    success: bool,
    job_id: String,
}

pub fn submit_jcl<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: SubmitJclParams = serde_json::from_value(params)?;
        let argv = vec!["job".to_string(), "submit-jcl".to_string(), "--only-jobid".to_string(), "true".to_string()];
        let stdout = exec_argv_with_stdin(ctx, &argv, params.jcl.as_bytes()).await?;
        Ok(serde_json::to_value(SubmitJclResponse { success: true, job_id: stdout.trim().to_string() })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitUssParams {
    path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitUssResponse {
    success: bool,
    path: String,
    job_id: String,
}

pub fn submit_uss<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: SubmitUssParams = serde_json::from_value(params)?;
        let stdout = exec_argv(ctx, &["job".to_string(), "submit-uss".to_string(), params.path.clone(), "--only-jobid".to_string(), "true".to_string()]).await?;
        Ok(serde_json::to_value(SubmitUssResponse {
            success: true,
            path: params.path,
            job_id: stdout.trim().to_string(),
        })?)
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobIdSuccessResponse {
    success: bool,
    job_id: String,
}

pub fn cancel_job<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["job".to_string(), "cancel".to_string(), params.job_id.clone()]).await?;
        Ok(serde_json::to_value(JobIdSuccessResponse { success: true, job_id: params.job_id })?)
    })
}

pub fn delete_job<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["job".to_string(), "delete".to_string(), params.job_id.clone()]).await?;
        Ok(serde_json::to_value(JobIdSuccessResponse { success: true, job_id: params.job_id })?)
    })
}

pub fn hold_job<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["job".to_string(), "hold".to_string(), params.job_id.clone()]).await?;
        Ok(serde_json::to_value(JobIdSuccessResponse { success: true, job_id: params.job_id })?)
    })
}

pub fn release_job<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: JobIdParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["job".to_string(), "release".to_string(), params.job_id.clone()]).await?;
        Ok(serde_json::to_value(JobIdSuccessResponse { success: true, job_id: params.job_id })?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_rows_with_too_few_fields_are_dropped() {
        let rows = csv_rows("JOB1, CC 0000, MYJOB\nJOB2, CC 0000, OTHERJOB, ACTIVE\n");
        let jobs: Vec<Job> = rows
            .into_iter()
            .filter(|row| row.len() >= 4)
            .map(|row| Job { id: row[0].clone(), retcode: row[1].clone(), name: row[2].clone(), status: row[3].clone() })
            .collect();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "JOB2");
    }
}
