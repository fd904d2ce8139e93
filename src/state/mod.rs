/// Host state management module
/// Owns every component the control channel reaches:
/// - deployment layout and resolver
/// - navigation guard
/// - window lifecycle controller
/// - external process launcher
///
/// Managed by Tauri as `Arc<HostState>` and shared by all command handlers
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::channel::{
    ControlMessage, MessageKind, OPEN_LOCAL_FILE_ERROR, OPEN_LOCAL_FILE_RESULT,
};
use crate::config::HostConfig;
use crate::deployment::Deployment;
use crate::error::ChannelError;
use crate::launcher::{ExternalProcessLauncher, LaunchResult};
use crate::navigation::NavigationGuard;
use crate::resolver::{contained_path, VirtualResourceResolver};
use crate::shell::SystemShell;
use crate::window::{EventSink, WindowLifecycleController};

/// Central host state container
pub struct HostState {
    config: HostConfig,
    deployment: Deployment,
    resolver: Arc<VirtualResourceResolver>,
    navigation: Arc<NavigationGuard>,
    window: Arc<WindowLifecycleController>,
    launcher: Arc<ExternalProcessLauncher>,
    events: Arc<dyn EventSink>,
}

impl HostState {
    pub fn new(
        config: HostConfig,
        deployment: Deployment,
        shell: Arc<dyn SystemShell>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let resolver = Arc::new(VirtualResourceResolver::new(&deployment, &config.entry_document));
        let launcher = Arc::new(ExternalProcessLauncher::new(
            deployment.app_root.path.clone(),
            config.launch.allowed_extensions.clone(),
            shell.clone(),
        ));

        Self {
            resolver,
            navigation: Arc::new(NavigationGuard::new(shell)),
            window: Arc::new(WindowLifecycleController::new(events.clone())),
            launcher,
            events,
            config,
            deployment,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn resolver(&self) -> Arc<VirtualResourceResolver> {
        self.resolver.clone()
    }

    pub fn navigation(&self) -> Arc<NavigationGuard> {
        self.navigation.clone()
    }

    pub fn window(&self) -> &WindowLifecycleController {
        &self.window
    }

    /// Answer a query inline
    pub fn query(&self, message: &ControlMessage) -> Result<Value, ChannelError> {
        let value = match message {
            ControlMessage::GetAppPath => {
                Value::String(self.deployment.app_root.path.to_string_lossy().to_string())
            }
            ControlMessage::CheckFileExists(path) => Value::Bool(self.check_file_exists(path)),
            other => return Err(ChannelError::NotAQuery(other.channel())),
        };
        debug!("{} -> {}", message.channel(), value);
        Ok(value)
    }

    /// Absolute paths are checked as given, relative ones under the app root.
    /// Any failure, escapes included, reports `false`.
    pub fn check_file_exists(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        if Path::new(path).is_absolute() {
            return Path::new(path).exists();
        }
        contained_path(&self.deployment.app_root.path, path)
            .map(|resolved| resolved.exists())
            .unwrap_or(false)
    }

    /// Run a fire-and-forget window command
    pub fn run_command(&self, message: &ControlMessage) -> Result<(), ChannelError> {
        match message {
            ControlMessage::WindowMinimize => self.window.minimize(),
            ControlMessage::WindowMaximize => self.window.toggle_maximize(),
            ControlMessage::WindowClose => self.window.close(),
            ControlMessage::WindowReload => self.window.reload(),
            other if other.kind() == MessageKind::Query => {
                return Err(ChannelError::UnexpectedQuery(other.channel()))
            }
            other => {
                warn!("{} is a request, not a command", other.channel());
            }
        }
        Ok(())
    }

    /// Run a launch request to completion and emit its reply event
    pub async fn run_request(&self, message: ControlMessage) {
        match message {
            ControlMessage::OpenLocalFile(path) => {
                // Success stays silent
                if let Err(e) = self.launcher.open_program(&path).await {
                    self.reply(OPEN_LOCAL_FILE_ERROR, json!(e.to_string()));
                }
            }
            ControlMessage::OpenLocalFileInDirectory(target) => {
                let result = LaunchResult::from(
                    self.launcher.open_document(&target.path, &target.directory).await,
                );
                match serde_json::to_value(&result) {
                    Ok(payload) => self.reply(OPEN_LOCAL_FILE_RESULT, payload),
                    Err(e) => warn!("Failed to serialize launch result: {}", e),
                }
            }
            other => warn!("{} is not a request", other.channel()),
        }
    }

    fn reply(&self, event: &str, payload: Value) {
        if let Err(e) = self.events.emit(event, payload) {
            warn!("Failed to emit {}: {}", event, e);
        }
    }
}
