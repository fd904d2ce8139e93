//! Window lifecycle management
//!
//! The controller owns the handle of the single primary window and the
//! `maximized` flag. Explicit toggles and native title-bar changes both end
//! in `transition`, which broadcasts only when the flag really changes.

pub mod main_window;
pub mod page_script;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::channel::WINDOW_STATE_CHANGED;

/// Operations the controller needs from a native window
pub trait WindowControl: Send + Sync {
    fn is_maximized(&self) -> Result<bool, String>;
    fn maximize(&self) -> Result<(), String>;
    fn unmaximize(&self) -> Result<(), String>;
    fn minimize(&self) -> Result<(), String>;
    fn close(&self) -> Result<(), String>;
    /// Unminimize, show and focus
    fn focus(&self) -> Result<(), String>;
    fn reload(&self) -> Result<(), String>;
}

/// Host → UI events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowState {
    pub maximized: bool,
}

pub struct WindowLifecycleController {
    window: RwLock<Option<Arc<dyn WindowControl>>>,
    maximized: AtomicBool,
    events: Arc<dyn EventSink>,
}

impl WindowLifecycleController {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            window: RwLock::new(None),
            maximized: AtomicBool::new(false),
            events,
        }
    }

    /// Take ownership of the primary window handle. Seeds the state without broadcasting.
    pub fn attach(&self, window: Arc<dyn WindowControl>) {
        let maximized = window.is_maximized().unwrap_or(false);
        self.maximized.store(maximized, Ordering::Release);
        *self.window.write() = Some(window);
        info!("Main window attached (maximized: {})", maximized);
    }

    /// Drop the handle once the native window is gone
    pub fn detach(&self) {
        if self.window.write().take().is_some() {
            info!("Main window detached");
        }
    }

    pub fn has_window(&self) -> bool {
        self.window.read().is_some()
    }

    pub fn state(&self) -> WindowState {
        WindowState {
            maximized: self.maximized.load(Ordering::Acquire),
        }
    }

    pub fn minimize(&self) {
        self.with_window("minimize", |window| window.minimize());
    }

    pub fn toggle_maximize(&self) {
        let Some(window) = self.current_window() else {
            debug!("toggle_maximize skipped: main window not found");
            return;
        };

        let maximized = window
            .is_maximized()
            .unwrap_or_else(|_| self.state().maximized);
        let result = if maximized {
            window.unmaximize()
        } else {
            window.maximize()
        };

        match result {
            Ok(()) => {
                self.transition(!maximized);
            }
            Err(e) => debug!("toggle_maximize ignored: {}", e),
        }
    }

    pub fn close(&self) {
        self.with_window("close", |window| window.close());
    }

    pub fn focus(&self) {
        self.with_window("focus", |window| window.focus());
    }

    pub fn reload(&self) {
        self.with_window("reload", |window| window.reload());
    }

    /// Native chrome maximized or restored the window
    pub fn observe_native(&self, maximized: bool) {
        self.transition(maximized);
    }

    /// Native resize event. Title-bar maximize/restore arrives this way; a
    /// minimized window reports nothing about its maximized state.
    pub fn on_native_resize(&self, minimized: bool, maximized: bool) {
        if minimized {
            return;
        }
        self.observe_native(maximized);
    }

    /// Single writer of `maximized`. Returns whether a broadcast went out.
    fn transition(&self, maximized: bool) -> bool {
        let previous = self.maximized.swap(maximized, Ordering::AcqRel);
        if previous == maximized {
            return false;
        }

        if let Err(e) = self.events.emit(WINDOW_STATE_CHANGED, Value::Bool(maximized)) {
            warn!("Failed to broadcast window state: {}", e);
        }
        true
    }

    fn current_window(&self) -> Option<Arc<dyn WindowControl>> {
        self.window.read().clone()
    }

    fn with_window<F>(&self, action: &str, f: F)
    where
        F: FnOnce(&dyn WindowControl) -> Result<(), String>,
    {
        let Some(window) = self.current_window() else {
            debug!("{} skipped: main window not found", action);
            return;
        };
        // A handle that died underneath us is a no-op
        if let Err(e) = f(window.as_ref()) {
            debug!("{} ignored: {}", action, e);
        }
    }
}

/// Whether closing the last window should end the process.
/// macOS apps stay alive with no windows open.
pub fn exit_when_last_window_closed() -> bool {
    !cfg!(target_os = "macos")
}
