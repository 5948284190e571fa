//! An in-process control that plays the hosted page.
//!
//! Instead of rendering messages to script, `LoopbackControl` applies them
//! to a [`Correlator`], the same pending-call table the injected runtime
//! keeps. It records everything else it is asked to do, so the whole
//! round trip can be driven without a window.

use serde_json::Value;
use tether_common::{BridgeError, SizeHint};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::codec::{self, ControlMessage, EventMessage, InvokePayload, MenuSelection};
use crate::control::Control;
use crate::correlator::{Correlator, Settlement};
use crate::script;

#[derive(Debug, Default)]
pub struct LoopbackControl {
    correlator: Correlator,
    start_scripts: Vec<String>,
    evaluated: Vec<String>,
    resolves: Vec<String>,
    events: Vec<EventMessage>,
    rejected_events: Vec<EventMessage>,
    broadcasts: Vec<MenuSelection>,
    title: Option<String>,
    size: Option<(u32, u32, SizeHint)>,
    url: Option<String>,
    terminated: bool,
}

impl LoopbackControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call binding `name` the way a page would: allocate a sequence, post
    /// the Invoke to the bridge, and hand back the pending reply.
    ///
    /// Fails with [`BridgeError::Closed`] once the bridge has shut down,
    /// since nothing could answer.
    pub fn call(
        &mut self,
        bridge: &Bridge,
        name: &str,
        payload: InvokePayload,
    ) -> Result<oneshot::Receiver<Settlement>, BridgeError> {
        if !bridge.is_running() {
            return Err(BridgeError::Closed);
        }
        let call = self.correlator.call(name, payload)?;
        bridge.handle_incoming(&call.wire)?;
        Ok(call.reply)
    }

    /// [`call`](Self::call) with JSON arguments.
    pub fn call_json(
        &mut self,
        bridge: &Bridge,
        name: &str,
        args: Value,
    ) -> Result<oneshot::Receiver<Settlement>, BridgeError> {
        self.call(bridge, name, InvokePayload::Json(args))
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn correlator_mut(&mut self) -> &mut Correlator {
        &mut self.correlator
    }

    pub fn start_scripts(&self) -> &[String] {
        &self.start_scripts
    }

    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    /// Every Resolve delivered, as wire strings.
    pub fn resolves(&self) -> &[String] {
        &self.resolves
    }

    pub fn events(&self) -> &[EventMessage] {
        &self.events
    }

    /// Events whose detail did not decode; the page never dispatched these.
    pub fn rejected_events(&self) -> &[EventMessage] {
        &self.rejected_events
    }

    /// Menu selections that settled no call.
    pub fn broadcasts(&self) -> &[MenuSelection] {
        &self.broadcasts
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn size(&self) -> Option<(u32, u32, SizeHint)> {
        self.size
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Control for LoopbackControl {
    fn inject_at_start(&mut self, js: &str) -> Result<(), BridgeError> {
        self.start_scripts.push(js.to_string());
        Ok(())
    }

    fn evaluate_script(&mut self, js: &str) -> Result<(), BridgeError> {
        self.evaluated.push(js.to_string());
        Ok(())
    }

    /// A successful navigation is a reload: the pending table starts over.
    fn navigate(&mut self, url: &str) -> Result<(), BridgeError> {
        if url.trim().is_empty() {
            return Err(BridgeError::Script("empty url".into()));
        }
        self.url = Some(url.to_string());
        self.correlator.reset();
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_size(&mut self, width: u32, height: u32, hint: SizeHint) {
        self.size = Some((width, height, hint));
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }

    fn deliver(&mut self, message: &ControlMessage) -> Result<(), BridgeError> {
        match message {
            ControlMessage::Resolve(resolve) => {
                let wire = codec::encode_resolve(resolve);
                let settled = self.correlator.settle(&wire)?;
                debug!(seq = resolve.sequence, settled, "loopback resolve");
                self.resolves.push(wire);
            }
            ControlMessage::MenuSelection(selection) => {
                if selection.settles().is_none() {
                    self.broadcasts.push(selection.clone());
                } else {
                    self.correlator.settle_menu(selection);
                }
            }
            ControlMessage::Event(event) => {
                // The page decodes the detail before dispatching.
                let decoded = match &event.detail {
                    Some(detail) => codec::decode_json(&codec::encode_text(detail)).map(drop),
                    None => Ok(()),
                };
                match decoded {
                    Ok(()) => self.events.push(event.clone()),
                    Err(e) => {
                        warn!(name = %event.name, error = %e, "event detail did not decode, not dispatched");
                        self.rejected_events.push(event.clone());
                    }
                }
            }
            ControlMessage::Invoke(_) => {
                let js = script::render(message)?;
                self.evaluated.push(js);
            }
        }
        Ok(())
    }
}
