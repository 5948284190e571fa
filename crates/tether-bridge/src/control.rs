//! The rendering control as seen by the bridge.
//!
//! A `Control` is owned by the UI thread and is only ever touched from
//! tasks drained off the dispatch queue. Each platform engine (GTK WebKit,
//! Cocoa WKWebView, Win32 WebView2, or a wry webview covering all three)
//! provides one implementation; the core never knows which.

use tether_common::{BridgeError, SizeHint};

use crate::codec::ControlMessage;
use crate::script;

pub trait Control {
    /// Register script that runs at document start on every page load.
    fn inject_at_start(&mut self, js: &str) -> Result<(), BridgeError>;

    /// Evaluate script now. The result is ignored.
    fn evaluate_script(&mut self, js: &str) -> Result<(), BridgeError>;

    fn navigate(&mut self, url: &str) -> Result<(), BridgeError>;

    fn set_title(&mut self, title: &str);

    fn set_size(&mut self, width: u32, height: u32, hint: SizeHint);

    /// Stop the UI event loop.
    fn terminate(&mut self);

    /// Index of the hosting window, reported in internal acks.
    fn window_index(&self) -> usize {
        0
    }

    /// Deliver a native -> script message. Renders it to script by default.
    fn deliver(&mut self, message: &ControlMessage) -> Result<(), BridgeError> {
        let js = script::render(message)?;
        self.evaluate_script(&js)
    }
}
