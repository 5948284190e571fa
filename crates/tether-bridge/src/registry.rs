//! Native side of bindings: name -> handler map plus outbound delivery.
//!
//! Registering a binding injects a document-start stub that exposes
//! `window[name]` to hosted script. Invokes arriving from the page are
//! decoded and routed to the handler, which answers through a
//! [`Responder`] from whatever thread it likes. Every answer is marshalled
//! through the dispatch queue before it touches the control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};
use tether_common::{CodecError, UnknownBindingPolicy};
use tracing::{debug, info, warn};

use crate::codec::{self, ControlMessage, EventMessage, InvokePayload, Resolve, Sequence};
use crate::control::Control;
use crate::dispatch::Dispatcher;
use crate::script;

/// A native function callable from hosted script.
pub type Handler = Arc<dyn Fn(Invocation) + Send + Sync>;

/// What happened to an incoming Invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler was called.
    Handled,
    /// No binding by that name; the call stays pending in the page.
    Dropped,
    /// No binding by that name; the call was settled with a failure.
    Rejected,
}

/// One call from hosted script, handed to its binding's handler.
#[derive(Debug)]
pub struct Invocation {
    pub sequence: Sequence,
    pub name: String,
    pub payload: InvokePayload,
    pub responder: Responder,
}

impl Invocation {
    /// Arguments as JSON. Context menu pairs become an object.
    pub fn args(&self) -> Value {
        self.payload.to_value()
    }
}

/// Completes one call. Consumed on use, so a handler answers at most once.
///
/// `Send`, so it can be moved to a worker thread and answered from there.
pub struct Responder {
    sequence: Sequence,
    dispatcher: Dispatcher<dyn Control>,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl Responder {
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Settle with `status` and a JSON text result.
    pub fn resolve(self, status: i32, result: impl Into<String>) {
        post_resolve(&self.dispatcher, self.sequence, status, result.into(), false);
    }

    pub fn ok(self, value: &Value) {
        self.resolve(0, value.to_string());
    }

    pub fn reject(self, value: &Value) {
        self.resolve(1, value.to_string());
    }

    /// Settle with a raw, non-JSON payload.
    pub fn resolve_internal(self, status: i32, raw: impl Into<String>) {
        post_resolve(&self.dispatcher, self.sequence, status, raw.into(), true);
    }
}

pub struct BindingRegistry {
    bindings: RwLock<HashMap<String, Handler>>,
    /// Document-start scripts in injection order.
    start_scripts: Mutex<Vec<String>>,
    dispatcher: Dispatcher<dyn Control>,
    policy: UnknownBindingPolicy,
    log_payloads: bool,
}

impl BindingRegistry {
    pub fn new(
        dispatcher: Dispatcher<dyn Control>,
        policy: UnknownBindingPolicy,
        log_payloads: bool,
    ) -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            start_scripts: Mutex::new(Vec::new()),
            dispatcher,
            policy,
            log_payloads,
        }
    }

    /// Install or replace the handler for `name`. The page stub is injected
    /// on first registration only; replacing a handler needs no new script.
    ///
    /// A name the wire format cannot carry is refused and nothing is installed.
    pub fn register(&self, name: &str, handler: impl Fn(Invocation) + Send + Sync + 'static) {
        if let Err(e) = codec::check_binding_name(name) {
            warn!(name, error = %e, "binding not registered");
            return;
        }

        let replaced = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(handler))
            .is_some();

        if replaced {
            debug!(name, "binding handler replaced");
        } else {
            info!(name, "binding registered");
            self.inject_at_start(script::binding_stub(name));
        }
    }

    /// Register a handler that receives `context` on every call.
    pub fn register_with<T>(
        &self,
        name: &str,
        context: T,
        handler: impl Fn(&T, Invocation) + Send + Sync + 'static,
    ) where
        T: Send + Sync + 'static,
    {
        self.register(name, move |call| handler(&context, call));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `js` as a document-start script and inject it.
    pub fn inject_at_start(&self, js: String) {
        self.start_scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(js.clone());

        self.dispatcher.submit(move |control| {
            if let Err(e) = control.inject_at_start(&js) {
                warn!(error = %e, "failed to inject document-start script");
            }
        });
    }

    /// Every document-start script injected so far, oldest first.
    pub fn start_scripts(&self) -> Vec<String> {
        self.start_scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decode an Invoke and hand it to its binding.
    ///
    /// The handler runs on the calling thread, outside the registry lock,
    /// so it may register bindings or resolve synchronously.
    pub fn dispatch_incoming(&self, raw: &str) -> Result<DispatchOutcome, CodecError> {
        let invoke = codec::decode_invoke(raw)?;
        if self.log_payloads {
            debug!(seq = invoke.sequence, name = %invoke.name, payload = ?invoke.payload, "invoke payload");
        }

        let handler = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&invoke.name)
            .cloned();

        let Some(handler) = handler else {
            return Ok(self.unknown_binding(invoke.sequence, &invoke.name));
        };

        debug!(seq = invoke.sequence, name = %invoke.name, "invoke");
        handler(Invocation {
            sequence: invoke.sequence,
            name: invoke.name,
            payload: invoke.payload,
            responder: self.responder(invoke.sequence),
        });
        Ok(DispatchOutcome::Handled)
    }

    fn unknown_binding(&self, sequence: Sequence, name: &str) -> DispatchOutcome {
        match self.policy {
            UnknownBindingPolicy::Drop => {
                debug!(seq = sequence, name, "invoke for unknown binding dropped");
                DispatchOutcome::Dropped
            }
            UnknownBindingPolicy::Reject => {
                warn!(seq = sequence, name, "invoke for unknown binding rejected");
                let error = json!({ "error": format!("unknown binding: {name}") });
                self.resolve(sequence, 1, error.to_string());
                DispatchOutcome::Rejected
            }
        }
    }

    /// A responder for `sequence`, for answering outside a handler.
    pub fn responder(&self, sequence: Sequence) -> Responder {
        Responder {
            sequence,
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Settle call `sequence` with a JSON text result. Safe from any thread.
    pub fn resolve(&self, sequence: Sequence, status: i32, result: impl Into<String>) {
        post_resolve(&self.dispatcher, sequence, status, result.into(), false);
    }

    /// Settle call `sequence` with a raw payload (window acks).
    pub fn resolve_internal(&self, sequence: Sequence, status: i32, raw: impl Into<String>) {
        post_resolve(&self.dispatcher, sequence, status, raw.into(), true);
    }

    /// Broadcast event `name` with optional JSON text detail.
    pub fn emit(&self, name: &str, detail: Option<String>) {
        debug!(name, payload_len = detail.as_ref().map_or(0, String::len), "emit");
        post(
            &self.dispatcher,
            ControlMessage::Event(EventMessage {
                name: name.to_string(),
                detail,
            }),
        );
    }

    /// Deliver any native -> script message through the queue.
    pub fn post(&self, message: ControlMessage) {
        post(&self.dispatcher, message);
    }
}

fn post_resolve(
    dispatcher: &Dispatcher<dyn Control>,
    sequence: Sequence,
    status: i32,
    payload: String,
    internal: bool,
) {
    debug!(seq = sequence, status, payload_len = payload.len(), internal, "resolve");
    post(
        dispatcher,
        ControlMessage::Resolve(Resolve {
            sequence,
            status,
            payload,
            internal,
        }),
    );
}

fn post(dispatcher: &Dispatcher<dyn Control>, message: ControlMessage) {
    dispatcher.submit(move |control| {
        if let Err(e) = control.deliver(&message) {
            warn!(seq = ?message.sequence(), error = %e, "failed to deliver message to script");
        }
    });
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{self, DispatchQueue};
    use crate::loopback::LoopbackControl;

    fn registry(policy: UnknownBindingPolicy) -> (BindingRegistry, DispatchQueue<dyn Control>) {
        let (dispatcher, queue) = dispatch::channel::<dyn Control>(|| {});
        (BindingRegistry::new(dispatcher, policy, false), queue)
    }

    #[test]
    fn register_injects_stub_once() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        reg.register("add", |_| {});
        reg.register("add", |_| {});
        assert_eq!(reg.len(), 1);

        let mut page = LoopbackControl::new();
        queue.run_pending(&mut page);
        assert_eq!(page.start_scripts().len(), 1);
        assert!(page.start_scripts()[0].contains(r#"const name = "add";"#));
        assert_eq!(reg.start_scripts(), page.start_scripts());
    }

    #[test]
    fn name_with_separator_is_refused() {
        let (reg, _queue) = registry(UnknownBindingPolicy::Drop);
        let before = reg.start_scripts().len();
        reg.register("a;b", |_| {});

        assert!(!reg.contains("a;b"));
        assert!(reg.is_empty());
        assert_eq!(reg.start_scripts().len(), before);
    }

    #[test]
    fn last_registration_wins() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        reg.register("who", |call| call.responder.ok(&json!("first")));
        reg.register("who", |call| call.responder.ok(&json!("second")));

        reg.dispatch_incoming("ipc;1;who;").unwrap();
        let mut page = LoopbackControl::new();
        queue.run_pending(&mut page);
        let expected = codec::encode_resolve(&Resolve {
            sequence: 1,
            status: 0,
            payload: "\"second\"".into(),
            internal: false,
        });
        assert_eq!(page.resolves(), &[expected]);
    }

    #[test]
    fn handler_receives_decoded_invocation() {
        let (reg, _queue) = registry(UnknownBindingPolicy::Drop);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        reg.register("add", move |call| {
            *sink.lock().unwrap() = Some((call.sequence, call.name.clone(), call.args()));
        });

        let outcome = reg.dispatch_incoming("ipc;3;add;WzIsM10=").unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some((3, "add".to_string(), json!([2, 3])))
        );
    }

    #[test]
    fn register_with_passes_context() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        reg.register_with("greet", String::from("hello"), |greeting, call| {
            let who = call.args();
            call.responder
                .ok(&json!(format!("{greeting} {}", who.as_str().unwrap_or("?"))));
        });

        let wire = codec::encode_invoke(1, "greet", &InvokePayload::Json(json!("rick"))).unwrap();
        reg.dispatch_incoming(&wire).unwrap();
        let mut page = LoopbackControl::new();
        queue.run_pending(&mut page);
        let resolve = codec::decode_resolve(&page.resolves()[0]).unwrap();
        assert_eq!(resolve.payload, "\"hello rick\"");
    }

    #[test]
    fn unknown_binding_is_dropped_without_resolve() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        let outcome = reg.dispatch_incoming("ipc;5;doesNotExist;WzFd").unwrap();
        assert_eq!(outcome, DispatchOutcome::Dropped);

        let mut page = LoopbackControl::new();
        assert_eq!(queue.run_pending(&mut page), 0);
        assert!(page.resolves().is_empty());
    }

    #[test]
    fn unknown_binding_rejected_under_reject_policy() {
        let (reg, queue) = registry(UnknownBindingPolicy::Reject);
        let outcome = reg.dispatch_incoming("ipc;5;doesNotExist;WzFd").unwrap();
        assert_eq!(outcome, DispatchOutcome::Rejected);

        let mut page = LoopbackControl::new();
        queue.run_pending(&mut page);
        let resolve = codec::decode_resolve(&page.resolves()[0]).unwrap();
        assert_eq!(resolve.sequence, 5);
        assert_eq!(resolve.status, 1);
        let body: Value = serde_json::from_str(&resolve.payload).unwrap();
        assert_eq!(body, json!({"error": "unknown binding: doesNotExist"}));
    }

    #[test]
    fn malformed_invoke_is_an_error() {
        let (reg, _queue) = registry(UnknownBindingPolicy::Drop);
        assert!(matches!(
            reg.dispatch_incoming("ipc;1;add"),
            Err(CodecError::Malformed { .. })
        ));
    }

    #[test]
    fn resolve_is_deferred_to_the_queue() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        reg.resolve(1, 0, "5");
        reg.resolve_internal(2, 0, "0");

        let mut page = LoopbackControl::new();
        assert!(page.resolves().is_empty());
        assert_eq!(queue.run_pending(&mut page), 2);
        assert_eq!(page.resolves(), &["external;0;1;NQ==", "internal;0;2;0"]);
    }

    #[test]
    fn emit_records_event() {
        let (reg, queue) = registry(UnknownBindingPolicy::Drop);
        reg.emit("character", Some(r#"{"firstname":"Morty"}"#.into()));

        let mut page = LoopbackControl::new();
        queue.run_pending(&mut page);
        assert_eq!(page.events()[0].name, "character");
        assert_eq!(
            page.events()[0].detail.as_deref(),
            Some(r#"{"firstname":"Morty"}"#)
        );
    }

    #[test]
    fn handler_may_register_during_dispatch() {
        let (reg, _queue) = registry(UnknownBindingPolicy::Drop);
        let reg = Arc::new(reg);
        let inner = Arc::clone(&reg);
        reg.register("bootstrap", move |_| inner.register("late", |_| {}));

        reg.dispatch_incoming("ipc;1;bootstrap;").unwrap();
        assert!(reg.contains("late"));
    }
}
