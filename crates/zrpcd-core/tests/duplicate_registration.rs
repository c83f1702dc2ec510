//! §8 testable property 7 / concrete scenario 6: registering the same
//! method twice during startup is a fatal defect. `daemon::run` takes an
//! already-built `Dispatcher` by value — a caller (the `zrpcd` binary)
//! that aborts on `Dispatcher::register`'s `Err` never reaches pool
//! construction or the readiness banner, so the guarantee holds
//! structurally rather than needing a runtime check inside `daemon::run`.

use serde_json::Value;
use zrpcd_core::{DaemonError, Dispatcher, HandlerContext, HandlerFuture};

fn noop(_ctx: &mut HandlerContext<'_>, _params: Value) -> HandlerFuture<'_> {
    Box::pin(async move { Ok(Value::Null) })
}

#[test]
fn duplicate_registration_is_fatal_before_any_daemon_state_exists() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("readFile", noop).expect("first registration succeeds");

    let err = dispatcher
        .register("readFile", noop)
        .expect_err("second registration for the same method must fail");
    assert!(matches!(err, DaemonError::DuplicateRegistration(name) if name == "readFile"));

    // A real caller exits here (see `zrpcd`'s `main`), so no `DaemonConfig`
    // or `WorkerPool` is ever constructed and no readiness banner is ever
    // written — there is no path from this `Err` into `daemon::run`.
}
