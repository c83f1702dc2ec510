//! Console operations (§6): `consoleCommand`. Argv shape grounded in
//! `original_source/native/golang/issue.go`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zrpcd_core::{HandlerContext, HandlerFuture};

use crate::exec::exec_argv;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleCommandParams {
    command_text: String,
    console_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleCommandResponse {
    data: String,
}

pub fn console_command<'a>(ctx: &'a mut HandlerContext<'a>, params: Value) -> HandlerFuture<'a> {
    Box::pin(async move {
        let params: ConsoleCommandParams = serde_json::from_value(params)?;
        let argv = vec![
            "console".to_string(),
            "issue".to_string(),
            params.command_text,
            "--cn".to_string(),
            params.console_name,
        ];
        let data = exec_argv(ctx, &argv).await?;
        Ok(serde_json::to_value(ConsoleCommandResponse { data })?)
    })
}
