//! Daemon-level end-to-end scenarios (§8 "Concrete end-to-end scenarios"),
//! driven against the actual compiled `zrpcd` binary with a fake helper
//! process standing in for the real z/OS native binary, following the same
//! fixture-process pattern as `zrpcd-handlers/tests/console_command.rs`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_helper.sh")
}

fn zrpcd_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_zrpcd"))
}

struct Daemon {
    _child: Child,
    _workdir: tempfile::TempDir,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Daemon {
    async fn spawn() -> Self {
        let workdir = tempfile::tempdir().expect("tempdir should be creatable");
        let mut child = Command::new(zrpcd_bin())
            .arg("--helper-path")
            .arg(fixture_path())
            .arg("--num-workers")
            .arg("1")
            .arg("--checksums-path")
            .arg(workdir.path().join("checksums.asc"))
            .arg("--log-path")
            .arg(workdir.path().join("zrpcd.log"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("zrpcd should spawn");
        let stdin = child.stdin.take().expect("stdin should be piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout should be piped"));
        Self {
            _child: child,
            _workdir: workdir,
            stdin,
            stdout,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.stdin.write_all(line.as_bytes()).await.unwrap();
        self.stdin.write_all(b"\n").await.unwrap();
        self.stdin.flush().await.unwrap();
    }

    async fn read_line(&mut self) -> serde_json::Value {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.stdout.read_line(&mut line))
            .await
            .expect("daemon should respond within 5s")
            .expect("reading daemon stdout should not fail");
        serde_json::from_str(&line).unwrap_or_else(|err| panic!("expected JSON line, got {line:?}: {err}"))
    }
}

#[tokio::test]
async fn readiness_banner_has_documented_shape_with_no_checksums_sidecar() {
    let mut daemon = Daemon::spawn().await;
    let banner = daemon.read_line().await;
    assert_eq!(banner["status"], "ready");
    assert!(banner["message"].as_str().unwrap().contains("ready"));
    assert!(banner["data"]["checksums"].is_null());
}

#[tokio::test]
async fn unknown_method_gets_method_not_found_error_with_id_echoed() {
    let mut daemon = Daemon::spawn().await;
    let _banner = daemon.read_line().await;

    daemon
        .send_line(r#"{"jsonrpc":"2.0","method":"noSuchMethod","params":{},"id":7}"#)
        .await;
    let response = daemon.read_line().await;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["message"], "Unrecognized command noSuchMethod");
    assert_eq!(response["id"], 7);
}

#[tokio::test]
async fn malformed_json_gets_parse_error_with_null_id() {
    let mut daemon = Daemon::spawn().await;
    let _banner = daemon.read_line().await;

    daemon.send_line("not json").await;
    let response = daemon.read_line().await;

    assert_eq!(response["error"]["code"], -32700);
    assert!(response["id"].is_null());
}

#[tokio::test]
async fn concurrent_requests_each_get_their_own_non_interleaved_response() {
    let mut daemon = Daemon::spawn().await;
    let _banner = daemon.read_line().await;

    daemon
        .send_line(r#"{"jsonrpc":"2.0","method":"noSuchMethod","params":{},"id":1}"#)
        .await;
    daemon
        .send_line(r#"{"jsonrpc":"2.0","method":"noSuchMethod","params":{},"id":2}"#)
        .await;

    let first = daemon.read_line().await;
    let second = daemon.read_line().await;

    let mut ids: Vec<i64> = vec![first["id"].as_i64().unwrap(), second["id"].as_i64().unwrap()];
    ids.sort();
    assert_eq!(ids, vec![1, 2]);
    assert!(first["error"]["code"].is_i64());
    assert!(second["error"]["code"].is_i64());
}
