use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tauri::webview::NewWindowResponse;
use tauri::{AppHandle, Emitter, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tracing::{info, warn};
use url::Url;

use super::page_script::page_script;
use super::{EventSink, WindowControl};
use crate::app::{APP_NAME, MAIN_WINDOW_LABEL};
use crate::resolver::protocol::ResolverReady;
use crate::resolver::VirtualScheme;
use crate::state::HostState;

impl<R: Runtime> WindowControl for WebviewWindow<R> {
    fn is_maximized(&self) -> Result<bool, String> {
        WebviewWindow::is_maximized(self).map_err(|e| e.to_string())
    }

    fn maximize(&self) -> Result<(), String> {
        WebviewWindow::maximize(self).map_err(|e| e.to_string())
    }

    fn unmaximize(&self) -> Result<(), String> {
        WebviewWindow::unmaximize(self).map_err(|e| e.to_string())
    }

    fn minimize(&self) -> Result<(), String> {
        WebviewWindow::minimize(self).map_err(|e| e.to_string())
    }

    fn close(&self) -> Result<(), String> {
        WebviewWindow::close(self).map_err(|e| e.to_string())
    }

    fn focus(&self) -> Result<(), String> {
        self.unminimize().map_err(|e| e.to_string())?;
        self.show().map_err(|e| e.to_string())?;
        self.set_focus().map_err(|e| e.to_string())
    }

    fn reload(&self) -> Result<(), String> {
        self.eval("window.location.reload()").map_err(|e| e.to_string())
    }
}

/// Emits host events to the main window
pub struct WebviewEvents<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> WebviewEvents<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> EventSink for WebviewEvents<R> {
    fn emit(&self, event: &str, payload: Value) -> Result<(), String> {
        self.app
            .emit_to(MAIN_WINDOW_LABEL, event, payload)
            .map_err(|e| e.to_string())
    }
}

/// URL the main window starts on
pub fn entry_url(entry_document: &str) -> Result<Url, url::ParseError> {
    Url::parse(&VirtualScheme::App.base_url())?.join(entry_document)
}

/// Build the primary window on the entry document, guarded by the navigation
/// policy, and hand it to the lifecycle controller.
/// Requires the resolver to be active so the first load cannot race it.
pub fn create<R: Runtime>(
    app: &AppHandle<R>,
    _ready: &ResolverReady,
    state: &HostState,
) -> Result<WebviewWindow<R>> {
    let entry_document = state.resolver().entry_document().to_string();
    let url = entry_url(&entry_document)
        .with_context(|| format!("invalid entry document: {}", entry_document))?;
    info!("Creating main window on {}", url);

    let navigation = state.navigation();
    let new_window_guard = state.navigation();
    let window = WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::CustomProtocol(url))
        .title(APP_NAME)
        .inner_size(1280.0, 800.0)
        .min_inner_size(800.0, 600.0)
        .visible(false)
        .initialization_script(&page_script())
        .on_navigation(move |url| navigation.on_navigation(url))
        .on_new_window(move |url, _features| {
            if new_window_guard.on_new_window(&url) {
                NewWindowResponse::Allow
            } else {
                NewWindowResponse::Deny
            }
        })
        .build()
        .context("failed to build main window")?;

    if state.config().start_maximized {
        if let Err(e) = window.maximize() {
            warn!("Failed to maximize main window: {}", e);
        }
    }
    window.show().context("failed to show main window")?;

    state.window().attach(Arc::new(window.clone()));
    Ok(window)
}
