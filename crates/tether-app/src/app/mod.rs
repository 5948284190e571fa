//! Top-level application state.
//!
//! Implements `winit::application::ApplicationHandler` to drive the main
//! event loop. Bridge work submitted from any thread wakes the loop with a
//! [`UserEvent::Wake`], and the queue is drained against the webview
//! control on this thread.

mod control;

use std::sync::Mutex;

use tether_bridge::{Bridge, Control, DispatchQueue};
use tether_config::TetherConfig;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::window::WindowId;

use crate::bindings;
use control::WryControl;

/// Events posted to the loop from outside winit.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// The dispatch queue has work.
    Wake,
    /// The page finished loading `url`.
    PageLoaded(String),
}

pub struct TetherApp {
    config: TetherConfig,
    bridge: Bridge,
    queue: DispatchQueue<dyn Control>,
    proxy: EventLoopProxy<UserEvent>,
    control: Option<WryControl>,
}

impl TetherApp {
    pub fn new(config: TetherConfig, event_loop: &EventLoop<UserEvent>, runtime: &Handle) -> Self {
        let proxy = event_loop.create_proxy();
        let waker = Mutex::new(proxy.clone());
        let (bridge, queue) = Bridge::new(
            move || {
                if let Ok(proxy) = waker.lock() {
                    // Fails only once the loop has exited.
                    let _ = proxy.send_event(UserEvent::Wake);
                }
            },
            crate::bridge_options(&config),
        );
        bindings::register(&bridge, runtime);

        Self {
            config,
            bridge,
            queue,
            proxy,
            control: None,
        }
    }

    /// Run everything queued so far against the webview.
    fn drain(&mut self, event_loop: &ActiveEventLoop) {
        // Until the window exists work stays queued.
        let Some(control) = self.control.as_mut() else {
            return;
        };
        let ran = self.queue.run_pending(control);
        if ran > 0 {
            debug!(ran, "drained dispatch queue");
        }
        if control.is_terminated() {
            info!("terminate requested");
            event_loop.exit();
        }
    }

    fn shutdown(&mut self) {
        let dropped = self.queue.close();
        info!(dropped, "dispatch queue closed");
    }
}

impl ApplicationHandler<UserEvent> for TetherApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.control.is_some() {
            return;
        }

        match WryControl::create(event_loop, &self.config, &self.bridge, self.proxy.clone()) {
            Ok(control) => {
                self.control = Some(control);
                self.drain(event_loop);
            }
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Wake => self.drain(event_loop),
            UserEvent::PageLoaded(url) => {
                debug!(%url, "page loaded");
                if let Some(control) = self.control.as_mut() {
                    control.replay_late_scripts();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(control) = self.control.as_ref() {
                    if let Err(e) = control.fit_to(size) {
                        warn!(error = %e, "failed to resize webview");
                    }
                }
            }

            WindowEvent::ThemeChanged(theme) => {
                debug!(?theme, "system theme changed");
                self.bridge.emit_theme_changed();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.queue.is_closed() {
            self.shutdown();
        }
    }
}
