//! Dataset operations (§6): `listDatasets`, `listDsMembers`, `readDataset`,
//! `writeDataset`, `createDataset`, `createMember`, `deleteDataset`,
//! `restoreDataset`. Argv shapes grounded in
//! `original_source/native/golang/cmds/ds.go`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zrpcd_core::{HandlerContext, HandlerFuture};

use crate::exec::{csv_rows, exec_argv, exec_argv_with_stdin, exec_streamed, StreamDirection};
use crate::types::{Dataset, DsMember};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDatasetsParams {
    pattern: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListDatasetsResponse {
    items: Vec<Dataset>,
    returned_rows: usize,
}

pub fn list_datasets<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ListDatasetsParams = serde_json::from_value(params)?;
        let argv = vec![
            "data-set".to_string(),
            "list".to_string(),
            params.pattern,
            "--warn".to_string(),
            "false".to_string(),
            "--rfc".to_string(),
            "true".to_string(),
        ];
        let stdout = exec_argv(ctx, &argv).await?;
        let items = csv_rows(&stdout)
            .into_iter()
            .filter(|row| row.len() >= 3)
            .map(|row| Dataset {
                name: row[0].clone(),
                dsorg: row[1].clone(),
                volser: row[2].clone(),
            })
            .collect::<Vec<_>>();
        let returned_rows = items.len();
        Ok(serde_json::to_value(ListDatasetsResponse { items, returned_rows })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDsMembersParams {
    dsname: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListDsMembersResponse {
    items: Vec<DsMember>,
    returned_rows: usize,
}

pub fn list_ds_members<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ListDsMembersParams = serde_json::from_value(params)?;
        let argv = vec!["data-set".to_string(), "list-members".to_string(), params.dsname];
        let stdout = exec_argv(ctx, &argv).await?;
        let items = stdout
            .lines()
            .map(|line| line.trim())
            .filter(|name| !name.is_empty())
            .map(|name| DsMember { name: name.to_string() })
            .collect::<Vec<_>>();
        let returned_rows = items.len();
        Ok(serde_json::to_value(ListDsMembersResponse { items, returned_rows })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadDatasetParams {
    dsname: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    stream_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadDatasetResponse {
    encoding: Option<String>,
    dataset: String,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<BTreeMap<String, String>>,
}

pub fn read_dataset<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ReadDatasetParams = serde_json::from_value(params)?;
        let mut argv = vec!["data-set".to_string(), "view".to_string(), params.dsname.clone()];
        if let Some(encoding) = &params.encoding {
            argv.extend(["--encoding".to_string(), encoding.clone(), "--rfb".to_string(), "true".to_string()]);
        }

        if params.stream_id != 0 {
            let metadata = exec_streamed(ctx, argv, params.stream_id, StreamDirection::Receive).await?;
            return Ok(serde_json::to_value(ReadDatasetResponse {
                encoding: params.encoding,
                dataset: params.dsname,
                data: String::new(),
                metadata: Some(metadata),
            })?);
        }

        let data = exec_argv(ctx, &argv).await?;
        Ok(serde_json::to_value(ReadDatasetResponse {
            encoding: params.encoding,
            dataset: params.dsname,
            data,
            metadata: None,
        })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteDatasetParams {
    dsname: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    data: String,
    #[serde(default)]
    stream_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteDatasetResponse {
    success: bool,
    dataset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<BTreeMap<String, String>>,
}

pub fn write_dataset<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: WriteDatasetParams = serde_json::from_value(params)?;
        let mut argv = vec!["data-set".to_string(), "write".to_string(), params.dsname.clone()];
        if let Some(encoding) = &params.encoding {
            argv.extend(["--encoding".to_string(), encoding.clone()]);
        }

        if params.stream_id != 0 {
            let metadata = exec_streamed(ctx, argv, params.stream_id, StreamDirection::Send).await?;
            return Ok(serde_json::to_value(WriteDatasetResponse {
                success: true,
                dataset: params.dsname,
                metadata: Some(metadata),
            })?);
        }

        exec_argv_with_stdin(ctx, &argv, params.data.as_bytes()).await?;
        Ok(serde_json::to_value(WriteDatasetResponse {
            success: true,
            dataset: params.dsname,
            metadata: None,
        })?)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DsnameOnlyParams {
    dsname: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DsnameSuccessResponse {
    success: bool,
    dsname: String,
}

pub fn create_dataset<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: DsnameOnlyParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["data-set".to_string(), "create".to_string(), params.dsname]).await?;
        Ok(serde_json::to_value(SuccessResponse { success: true })?)
    })
}

pub fn create_member<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: DsnameOnlyParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["data-set".to_string(), "create-member".to_string(), params.dsname]).await?;
        Ok(serde_json::to_value(SuccessResponse { success: true })?)
    })
}

pub fn delete_dataset<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: DsnameOnlyParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["data-set".to_string(), "delete".to_string(), params.dsname.clone()]).await?;
        Ok(serde_json::to_value(DsnameSuccessResponse { success: true, dsname: params.dsname })?)
    })
}

pub fn restore_dataset<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: DsnameOnlyParams = serde_json::from_value(params)?;
        exec_argv(ctx, &["data-set".to_string(), "restore".to_string(), params.dsname]).await?;
        Ok(serde_json::to_value(SuccessResponse { success: true })?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_skips_blank_lines() {
        let rows = csv_rows("A.B.C, PO, VOL1\n\nD.E.F, PS, VOL2\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "A.B.C");
    }
}
