//! Headless round trip through the bridge, driven by a loopback page.
//!
//! Exercises the same bindings the window serves, plus a context menu
//! choice, an unknown binding and shutdown, without creating a window.

use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tether_bridge::codec::{self, CONTEXT_MENU_BINDING};
use tether_bridge::{
    Bridge, ContextMenu, Control, DispatchQueue, InvokePayload, LoopbackControl, Settlement,
};
use tether_common::{TetherError, UnknownBindingPolicy};
use tether_config::TetherConfig;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::info;

use crate::bindings;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

type Reply = oneshot::Receiver<Settlement>;

struct Harness {
    bridge: Bridge,
    queue: DispatchQueue<dyn Control>,
    page: LoopbackControl,
}

impl Harness {
    fn call(&mut self, name: &str, payload: InvokePayload) -> Result<Reply, TetherError> {
        Ok(self.page.call(&self.bridge, name, payload)?)
    }

    /// Drain until `reply` settles or the timeout passes.
    fn settle(&mut self, reply: &mut Reply) -> Result<Settlement, TetherError> {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        loop {
            self.queue.run_pending(&mut self.page);
            match reply.try_recv() {
                Ok(settlement) => return Ok(settlement),
                Err(TryRecvError::Empty) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(TryRecvError::Empty) => {
                    return Err(TetherError::Other("call did not settle in time".into()))
                }
                Err(TryRecvError::Closed) => {
                    return Err(TetherError::Other("call was abandoned".into()))
                }
            }
        }
    }

    fn expect_value(
        &mut self,
        step: &str,
        reply: &mut Reply,
        expected: Value,
    ) -> Result<(), TetherError> {
        match self.settle(reply)? {
            Ok(value) if value == expected => {
                info!(step, %value, "ok");
                Ok(())
            }
            other => Err(TetherError::Other(format!(
                "{step}: expected {expected}, got {other:?}"
            ))),
        }
    }
}

pub fn run(config: &TetherConfig) -> Result<(), TetherError> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (bridge, queue) = Bridge::new(|| {}, crate::bridge_options(config));
    bindings::register(&bridge, runtime.handle());
    bridge.register_binding_with(CONTEXT_MENU_BINDING, bridge.clone(), |bridge, call| {
        // Stand-in for the user picking the second entry.
        let menu = ContextMenu::from_payload(&call.payload).unwrap_or_default();
        if let Some(selection) = menu.select(2, call.sequence, "") {
            bridge.resolve_menu_selection(selection);
        }
    });

    let mut h = Harness {
        bridge,
        queue,
        page: LoopbackControl::new(),
    };

    let mut reply = h.call("add", InvokePayload::Json(json!([2, 3])))?;
    h.expect_value("add", &mut reply, json!(5))?;
    if !h.page.resolves().iter().any(|wire| wire == "external;0;1;NQ==") {
        return Err(TetherError::Other("add: unexpected resolve wire".into()));
    }

    let mut reply = h.call("echo", InvokePayload::Json(json!({"firstname": "Rick"})))?;
    h.expect_value("echo", &mut reply, json!({"firstname": "Rick"}))?;

    let mut reply = h.call("delay", InvokePayload::Json(json!([20, "from a worker"])))?;
    h.expect_value("delay", &mut reply, json!("from a worker"))?;

    let pairs = codec::parse_pairs("Copy:Cmd+C_---_Paste:Cmd+V");
    let mut reply = h.call(CONTEXT_MENU_BINDING, InvokePayload::Pairs(pairs))?;
    h.expect_value(
        "contextMenu",
        &mut reply,
        json!({"title": "Paste", "parent": "contextMenu", "state": ""}),
    )?;

    let mut reply = h.call("setTitle", InvokePayload::Json(json!(["self-test"])))?;
    h.expect_value("setTitle", &mut reply, json!("0"))?;

    let mut reply = h.call("doesNotExist", InvokePayload::Json(json!([])))?;
    h.queue.run_pending(&mut h.page);
    let unknown = reply.try_recv();
    match (config.bridge.unknown_binding, unknown) {
        (UnknownBindingPolicy::Drop, Err(TryRecvError::Empty)) => {
            info!(step = "unknown binding", "dropped")
        }
        (UnknownBindingPolicy::Reject, Ok(Err(_))) => {
            info!(step = "unknown binding", "rejected")
        }
        (policy, other) => {
            return Err(TetherError::Other(format!(
                "unknown binding under {policy:?}: got {other:?}"
            )))
        }
    }

    h.bridge.terminate();
    h.bridge.set_title("after terminate", None);
    h.queue.run_pending(&mut h.page);
    if !h.page.is_terminated() || h.page.title() != Some("self-test") {
        return Err(TetherError::Other("terminate did not stop the queue".into()));
    }
    info!(step = "terminate", "ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_test_passes_with_defaults() {
        run(&TetherConfig::default()).unwrap();
    }

    #[test]
    fn self_test_passes_with_reject_policy() {
        let mut config = TetherConfig::default();
        config.bridge.unknown_binding = UnknownBindingPolicy::Reject;
        run(&config).unwrap();
    }
}
