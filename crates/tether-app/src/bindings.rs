//! Bindings the demo page can call.

use std::time::Duration;

use serde_json::{json, Value};
use tether_bridge::{Bridge, Invocation};
use tokio::runtime::Handle;
use tracing::debug;

/// Longest delay `delay` will wait.
const MAX_DELAY_MS: u64 = 10_000;

pub fn register(bridge: &Bridge, runtime: &Handle) {
    bridge.register_binding("add", add);
    bridge.register_binding("echo", echo);
    bridge.register_binding_with("delay", runtime.clone(), delay);
    bridge.register_binding_with("setTitle", bridge.clone(), set_title);
}

/// `add(...numbers)`: the sum, integral when every term is.
fn add(call: Invocation) {
    match sum(&call.args()) {
        Some(total) => call.responder.ok(&total),
        None => call
            .responder
            .reject(&json!({ "error": "add expects an array of numbers" })),
    }
}

fn sum(args: &Value) -> Option<Value> {
    let terms = args.as_array()?;
    let ints = terms
        .iter()
        .map(Value::as_i64)
        .collect::<Option<Vec<_>>>()
        .and_then(|ints| ints.into_iter().try_fold(0i64, i64::checked_add));
    if let Some(total) = ints {
        return Some(json!(total));
    }
    let total: f64 = terms
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .sum();
    Some(json!(total))
}

fn echo(call: Invocation) {
    let args = call.args();
    call.responder.ok(&args);
}

/// `delay(ms, value)`: resolves with `value` after `ms`, from a runtime
/// worker rather than the UI thread.
fn delay(runtime: &Handle, call: Invocation) {
    let Invocation {
        sequence,
        payload,
        responder,
        ..
    } = call;
    let args = payload.to_value();
    let ms = args[0].as_u64().unwrap_or(0).min(MAX_DELAY_MS);
    let value = args[1].clone();

    debug!(seq = sequence, ms, "delayed resolve scheduled");
    runtime.spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        responder.ok(&value);
    });
}

/// `setTitle(title)`: answered by the window with its index.
fn set_title(bridge: &Bridge, call: Invocation) {
    match call.args()[0].as_str() {
        Some(title) => bridge.set_title(title, Some(call.sequence)),
        None => call
            .responder
            .reject(&json!({ "error": "setTitle expects a string" })),
    }
}

// =============================================================================
// TESTS
// =============================================================================
