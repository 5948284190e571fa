//! `Control` backed by a wry webview inside a winit window.
//!
//! wry only accepts initialization scripts before the webview is built, so
//! the bridge's document-start scripts at creation time are baked in. Any
//! script injected later is evaluated immediately and again after every
//! page load.

use std::collections::HashSet;
use std::sync::Arc;

use tether_bridge::{Bridge, BridgeError, Control};
use tether_common::SizeHint;
use tether_config::TetherConfig;
use tracing::{debug, warn};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes};
use wry::{PageLoadEvent, WebView, WebViewBuilder};

use super::UserEvent;

const BLANK_PAGE: &str = "<html><body></body></html>";

pub struct WryControl {
    window: Arc<Window>,
    webview: WebView,
    /// Scripts passed to the builder; these already run on every load.
    baked: HashSet<String>,
    /// Scripts injected after build, replayed on every load.
    late: Vec<String>,
    terminated: bool,
}

impl WryControl {
    /// Create the window and its webview, wiring the page's posted messages
    /// into `bridge`.
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &TetherConfig,
        bridge: &Bridge,
        proxy: EventLoopProxy<UserEvent>,
    ) -> Result<Self, BridgeError> {
        let settings = &config.window;
        let attrs = WindowAttributes::default()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(settings.width),
                f64::from(settings.height),
            ))
            .with_resizable(settings.size_hint.is_resizable());

        let window = event_loop
            .create_window(attrs)
            .map(Arc::new)
            .map_err(|e| BridgeError::Transport(format!("failed to create window: {e}")))?;

        let scripts = bridge.start_scripts();
        let mut builder = WebViewBuilder::new()
            .with_bounds(fill_bounds(window.inner_size()))
            .with_devtools(settings.devtools);
        for js in &scripts {
            builder = builder.with_initialization_script(js);
        }

        // Page -> native
        let incoming = bridge.clone();
        builder = builder.with_ipc_handler(move |request| {
            // Malformed messages are logged and dropped by the bridge.
            let _ = incoming.handle_incoming(request.body());
        });

        builder = builder.with_on_page_load_handler(move |event, url| {
            if matches!(event, PageLoadEvent::Finished) {
                let _ = proxy.send_event(UserEvent::PageLoaded(url));
            }
        });

        builder = match (&settings.url, &settings.html) {
            (Some(url), _) => builder.with_url(url),
            (None, Some(html)) => builder.with_html(html),
            (None, None) => builder.with_html(BLANK_PAGE),
        };

        let webview = builder
            .build_as_child(window.as_ref())
            .map_err(|e| BridgeError::Transport(format!("failed to create webview: {e}")))?;
        debug!(scripts = scripts.len(), "webview created");

        let mut control = Self {
            window,
            webview,
            baked: scripts.into_iter().collect(),
            late: Vec::new(),
            terminated: false,
        };
        if !matches!(settings.size_hint, SizeHint::None | SizeHint::Fixed) {
            control.set_size(settings.width, settings.height, settings.size_hint);
        }
        Ok(control)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Keep the webview covering the whole window.
    pub fn fit_to(&self, size: PhysicalSize<u32>) -> Result<(), BridgeError> {
        self.webview
            .set_bounds(fill_bounds(size))
            .map_err(|e| BridgeError::Script(e.to_string()))
    }

    pub fn replay_late_scripts(&mut self) {
        for js in &self.late {
            if let Err(e) = self.webview.evaluate_script(js) {
                warn!(error = %e, "failed to replay document-start script");
            }
        }
    }
}

fn fill_bounds(size: PhysicalSize<u32>) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(0, 0)),
        size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(size.width, size.height)),
    }
}

impl Control for WryControl {
    fn inject_at_start(&mut self, js: &str) -> Result<(), BridgeError> {
        if self.baked.contains(js) {
            return Ok(());
        }
        self.late.push(js.to_string());
        self.evaluate_script(js)
    }

    fn evaluate_script(&mut self, js: &str) -> Result<(), BridgeError> {
        self.webview
            .evaluate_script(js)
            .map_err(|e| BridgeError::Script(e.to_string()))
    }

    fn navigate(&mut self, url: &str) -> Result<(), BridgeError> {
        self.webview
            .load_url(url)
            .map_err(|e| BridgeError::Script(format!("failed to load {url}: {e}")))
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn set_size(&mut self, width: u32, height: u32, hint: SizeHint) {
        let size = LogicalSize::new(f64::from(width), f64::from(height));
        match hint {
            SizeHint::Min => self.window.set_min_inner_size(Some(size)),
            SizeHint::Max => self.window.set_max_inner_size(Some(size)),
            SizeHint::None | SizeHint::Fixed => {
                self.window.set_resizable(hint.is_resizable());
                if let Some(actual) = self.window.request_inner_size(size) {
                    if let Err(e) = self.fit_to(actual) {
                        warn!(error = %e, "failed to resize webview");
                    }
                }
            }
        }
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}
