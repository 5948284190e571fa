//! The `Bridge` façade.
//!
//! Owns the binding registry and the sending half of the dispatch queue.
//! Cheap to clone; every clone talks to the same page. All methods are safe
//! to call from any thread: anything that touches the control is queued
//! and runs on the UI thread the next time the event loop drains.

use std::sync::Arc;

use serde_json::Value;
use tether_common::{CodecError, SizeHint, UnknownBindingPolicy};
use tracing::{debug, info, warn};

use crate::codec::{ControlMessage, MenuSelection, Resolve, Sequence};
use crate::control::Control;
use crate::dispatch::{self, DispatchQueue, Dispatcher, UiWaker};
use crate::registry::{BindingRegistry, DispatchOutcome, Invocation};
use crate::script;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    pub unknown_binding: UnknownBindingPolicy,
    /// Log decoded Invoke payloads at debug level.
    pub log_payloads: bool,
}

#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

struct Inner {
    registry: BindingRegistry,
    dispatcher: Dispatcher<dyn Control>,
}

impl Bridge {
    /// Create a bridge bound to the calling thread.
    ///
    /// The returned queue must stay on this thread; the event loop drains it
    /// with the control whenever `waker` fires. The hosted-script runtime is
    /// the first document-start script.
    pub fn new(
        waker: impl UiWaker + 'static,
        options: BridgeOptions,
    ) -> (Self, DispatchQueue<dyn Control>) {
        let (dispatcher, queue) = dispatch::channel::<dyn Control>(waker);
        let registry = BindingRegistry::new(
            dispatcher.clone(),
            options.unknown_binding,
            options.log_payloads,
        );
        registry.inject_at_start(script::runtime());

        let bridge = Self {
            inner: Arc::new(Inner {
                registry,
                dispatcher,
            }),
        };
        (bridge, queue)
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.inner.registry
    }

    // -- bindings --

    pub fn register_binding(
        &self,
        name: &str,
        handler: impl Fn(Invocation) + Send + Sync + 'static,
    ) {
        self.inner.registry.register(name, handler);
    }

    pub fn register_binding_with<T>(
        &self,
        name: &str,
        context: T,
        handler: impl Fn(&T, Invocation) + Send + Sync + 'static,
    ) where
        T: Send + Sync + 'static,
    {
        self.inner.registry.register_with(name, context, handler);
    }

    /// Incoming-message callback: route a raw string posted by the page.
    pub fn handle_incoming(&self, raw: &str) -> Result<DispatchOutcome, CodecError> {
        self.inner.registry.dispatch_incoming(raw).inspect_err(|e| {
            warn!(body_len = raw.len(), error = %e, "discarding malformed message from script");
        })
    }

    // -- settlement and events --

    /// Settle call `sequence` with a JSON text result.
    pub fn resolve(&self, sequence: Sequence, status: i32, result: impl Into<String>) {
        self.inner.registry.resolve(sequence, status, result);
    }

    pub fn resolve_value(&self, sequence: Sequence, status: i32, value: &Value) {
        self.resolve(sequence, status, value.to_string());
    }

    /// Settle call `sequence` with a raw payload that is not JSON.
    pub fn resolve_internal(&self, sequence: Sequence, status: i32, raw: impl Into<String>) {
        self.inner.registry.resolve_internal(sequence, status, raw);
    }

    /// Broadcast event `name` with a JSON text detail.
    pub fn emit(&self, name: &str, detail: impl Into<String>) {
        self.inner.registry.emit(name, Some(detail.into()));
    }

    pub fn emit_value(&self, name: &str, detail: &Value) {
        self.emit(name, detail.to_string());
    }

    pub fn emit_theme_changed(&self) {
        self.inner.registry.emit(script::THEME_EVENT, None);
    }

    /// Deliver a menu click. A positive sequence settles that call, anything
    /// else broadcasts `menuItemSelected`.
    pub fn resolve_menu_selection(&self, selection: MenuSelection) {
        debug!(seq = ?selection.sequence, title = %selection.title, parent = %selection.parent, "menu selection");
        self.inner
            .registry
            .post(ControlMessage::MenuSelection(selection));
    }

    // -- control passthrough --

    /// Run `task` against the control on the UI thread.
    pub fn dispatch(&self, task: impl FnOnce(&mut (dyn Control + 'static)) + Send + 'static) {
        self.inner.dispatcher.submit(task);
    }

    /// Evaluate `js` in the current page.
    pub fn eval(&self, js: impl Into<String>) {
        let js = js.into();
        self.dispatch(move |control| {
            if let Err(e) = control.evaluate_script(&js) {
                warn!(error = %e, "script evaluation failed");
            }
        });
    }

    /// Inject `js` at document start of this and every later page.
    pub fn init(&self, js: impl Into<String>) {
        self.inner.registry.inject_at_start(js.into());
    }

    /// Load `url`. With `ack`, settles that call with the window index.
    pub fn navigate(&self, url: impl Into<String>, ack: Option<Sequence>) {
        let url = url.into();
        self.dispatch(move |control| {
            let status = match control.navigate(&url) {
                Ok(()) => 0,
                Err(e) => {
                    warn!(%url, error = %e, "navigation failed");
                    1
                }
            };
            if let Some(sequence) = ack {
                acknowledge(control, sequence, status);
            }
        });
    }

    pub fn set_title(&self, title: impl Into<String>, ack: Option<Sequence>) {
        let title = title.into();
        self.dispatch(move |control| {
            control.set_title(&title);
            if let Some(sequence) = ack {
                acknowledge(control, sequence, 0);
            }
        });
    }

    pub fn set_size(&self, width: u32, height: u32, hint: SizeHint, ack: Option<Sequence>) {
        self.dispatch(move |control| {
            control.set_size(width, height, hint);
            if let Some(sequence) = ack {
                acknowledge(control, sequence, 0);
            }
        });
    }

    /// Stop the UI loop. Work queued before this runs first; anything
    /// queued afterwards is dropped.
    pub fn terminate(&self) {
        info!("terminating");
        self.inner
            .dispatcher
            .shutdown(|control| control.terminate());
    }

    pub fn is_running(&self) -> bool {
        self.inner.dispatcher.is_accepting()
    }

    /// Runtime, init scripts and binding stubs, in injection order. Engines
    /// that take initialization scripts only at build time start from these.
    pub fn start_scripts(&self) -> Vec<String> {
        self.inner.registry.start_scripts()
    }
}

/// Internal resolve carrying the window index, as window operations answer.
fn acknowledge<C: Control + ?Sized>(control: &mut C, sequence: Sequence, status: i32) {
    let message = ControlMessage::Resolve(Resolve {
        sequence,
        status,
        payload: control.window_index().to_string(),
        internal: true,
    });
    if let Err(e) = control.deliver(&message) {
        warn!(seq = sequence, error = %e, "failed to acknowledge window operation");
    }
}

// =============================================================================
// TESTS
// =============================================================================
