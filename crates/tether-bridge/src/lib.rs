//! Bidirectional IPC bridge between a native host and embedded web content.
//!
//! The bridge is built from four pieces:
//! - a dispatch queue that marshals work onto the UI-owning thread
//! - a codec for the semicolon-delimited wire protocol
//! - a binding registry mapping names to native handlers
//! - a sequence correlator modelling the hosted-script side of each call
//!
//! `Bridge` glues them to a platform [`Control`], which supplies the
//! inject-at-start, evaluate, and navigation primitives.

pub mod bridge;
pub mod codec;
pub mod control;
pub mod correlator;
pub mod dispatch;
pub mod loopback;
pub mod menu;
pub mod registry;
pub mod script;

pub use tether_common::{BridgeError, CallError, CodecError};

pub use bridge::{Bridge, BridgeOptions};
pub use codec::{
    ControlMessage, EventMessage, Invoke, InvokePayload, MenuSelection, Resolve, Scope, Sequence,
};
pub use control::Control;
pub use correlator::{Correlator, OutboundCall, Settlement};
pub use dispatch::{DispatchQueue, Dispatcher, Task, UiWaker};
pub use loopback::LoopbackControl;
pub use menu::{ContextMenu, Menu, MenuItem, SystemMenu};
pub use registry::{BindingRegistry, DispatchOutcome, Handler, Invocation, Responder};
