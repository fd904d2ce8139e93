/// Navigation guard for the main webview
///
/// Only local content may load in place. Everything else is cancelled and
/// handed to the OS default handler, exactly once per attempt.
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::shell::SystemShell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    OpenExternally,
}

/// `app` scheme content or the local entry document
pub fn is_local_url(url: &Url) -> bool {
    match url.scheme() {
        "app" => true,
        // Windows serves custom schemes as http(s)://<scheme>.localhost
        "http" | "https" => matches!(url.host_str(), Some("app.localhost" | "tauri.localhost")),
        "tauri" => url.host_str() == Some("localhost"),
        "about" => url.path() == "blank",
        _ => false,
    }
}

pub fn decide(url: &Url) -> NavigationDecision {
    if is_local_url(url) {
        NavigationDecision::Allow
    } else {
        NavigationDecision::OpenExternally
    }
}

pub struct NavigationGuard {
    shell: Arc<dyn SystemShell>,
}

impl NavigationGuard {
    pub fn new(shell: Arc<dyn SystemShell>) -> Self {
        Self { shell }
    }

    /// In-place navigation. Returns whether the webview may proceed.
    pub fn on_navigation(&self, url: &Url) -> bool {
        self.apply("navigation", url)
    }

    /// `window.open` / target=_blank. Returns whether the new window may open.
    pub fn on_new_window(&self, url: &Url) -> bool {
        self.apply("new window", url)
    }

    fn apply(&self, source: &str, url: &Url) -> bool {
        match decide(url) {
            NavigationDecision::Allow => true,
            NavigationDecision::OpenExternally => {
                info!("Blocked {} to {}, opening externally", source, url);
                if let Err(e) = self.shell.open_external(url.as_str()) {
                    error!("Failed to open {} externally: {}", url, e);
                }
                false
            }
        }
    }
}
