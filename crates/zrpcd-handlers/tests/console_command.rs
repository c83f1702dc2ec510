//! Exercises `consoleCommand` end-to-end against a fake helper process
//! standing in for the real z/OS binary, per the donor's `tests/fixtures.rs`
//! pattern generalized to this daemon's child-process sub-protocol.

use std::path::PathBuf;

use std::sync::Arc;

use serde_json::json;
use zrpcd_core::{ChildChannel, Dispatcher, HandlerContext, OutputSink, StreamManager};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_helper.sh")
}

#[tokio::test]
async fn console_command_round_trips_through_the_helper_protocol() {
    let mut channel = ChildChannel::spawn(&fixture_path(), 0)
        .await
        .expect("fake helper should spawn and advertise a banner");
    let stream = StreamManager::new();
    let output = Arc::new(OutputSink::new());
    let mut ctx = HandlerContext {
        channel: &mut channel,
        stream: &stream,
        output,
    };

    let mut dispatcher = Dispatcher::new();
    zrpcd_handlers::register_all(&mut dispatcher).unwrap();
    let handler = dispatcher.get("consoleCommand").expect("consoleCommand is registered");

    let params = json!({ "commandText": "D A,L", "consoleName": "CN1" });
    let result = handler(&mut ctx, params).await.expect("fake helper exits 0");

    let data = result.get("data").and_then(|v| v.as_str()).unwrap();
    assert!(data.contains("D A,L"), "response should echo the command text, got: {data}");
    assert!(data.contains("CN1"), "response should echo the console name, got: {data}");
}
