use std::path::Path;
use tauri::{AppHandle, Runtime};
use tauri_plugin_opener::OpenerExt;

/// OS "open with the default handler" actions.
/// Behind a trait so navigation and launching can be tested without a desktop.
pub trait SystemShell: Send + Sync {
    /// Hand a URL to the default external handler. Returns once the handler is started.
    fn open_external(&self, url: &str) -> Result<(), String>;

    /// Open a local file with its default application. Failures the OS reports
    /// at launch (no associated application, access denied) are returned.
    fn open_path(&self, path: &Path) -> Result<(), String>;
}

/// Shell backed by the opener plugin. Targets go to the OS as a single
/// argument (ShellExecute on Windows), never through a command interpreter.
pub struct OpenerShell<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> OpenerShell<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> SystemShell for OpenerShell<R> {
    fn open_external(&self, url: &str) -> Result<(), String> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| format!("Failed to open URL: {}", e))
    }

    fn open_path(&self, path: &Path) -> Result<(), String> {
        self.app
            .opener()
            .open_path(path.to_string_lossy(), None::<&str>)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))
    }
}
