mod app;
mod channel;
mod commands;
mod config;
mod deployment;
mod error;
mod launcher;
mod navigation;
mod resolver;
mod shell;
mod state;
#[cfg(test)]
mod testing;
mod window;

use std::sync::Arc;
use tauri::{AppHandle, Manager, RunEvent, Runtime, WindowEvent};
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::MakeWriter;

use app::{APP_NAME, APP_VERSION, MAIN_WINDOW_LABEL};
use config::HostConfig;
use resolver::protocol;
use shell::OpenerShell;
use state::HostState;
use window::main_window::{self, WebviewEvents};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // The configured level is only known after loading, so config
    // diagnostics go through a scoped INFO logger
    let config = with_startup_logger(std::io::stdout, HostConfig::load);

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let builder = tauri::Builder::default()
        .enable_macos_default_menu(false)
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_single_instance::init(|app, argv, _cwd| {
            info!("Second instance started with {:?}, focusing main window", argv);
            focus_main_window(app);
        }));

    // Schemes must exist before the first webview does
    let app = protocol::register_schemes(builder)
        .setup(move |app| {
            let handle = app.handle().clone();

            let deployment = deployment::locate(&config, || {
                handle.path().resource_dir().map_err(|e| e.to_string())
            })?;
            let audit = deployment::audit(&deployment, &config);
            if !audit.missing_roots.is_empty() || !audit.missing_cursors.is_empty() {
                warn!(
                    "Starting with {} missing roots and {} missing cursors",
                    audit.missing_roots.len(),
                    audit.missing_cursors.len()
                );
            }

            let events = Arc::new(WebviewEvents::new(handle.clone()));
            let state = Arc::new(HostState::new(
                config,
                deployment,
                Arc::new(OpenerShell::new(handle.clone())),
                events,
            ));

            let ready = protocol::activate(&handle, state.resolver());
            app.manage(state.clone());

            main_window::create(&handle, &ready, &state)?;
            info!("Main window ready ({:?} deployment)", state.deployment().mode);
            Ok(())
        })
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            let Some(state) = window.try_state::<Arc<HostState>>() else {
                return;
            };

            match event {
                // Title-bar maximize/restore arrives as a resize
                WindowEvent::Resized(_) => {
                    match (window.is_minimized(), window.is_maximized()) {
                        (Ok(minimized), Ok(maximized)) => {
                            state.window().on_native_resize(minimized, maximized);
                        }
                        (Err(e), _) | (_, Err(e)) => {
                            debug!("Failed to read window state: {}", e)
                        }
                    }
                }
                WindowEvent::Destroyed => state.window().detach(),
                _ => {}
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::control_query,
            commands::control_send,
        ])
        .build(tauri::generate_context!());

    let app = match app {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start {}: {}", APP_NAME, e);
            std::process::exit(1);
        }
    };

    app.run(|app_handle, event| match event {
        RunEvent::ExitRequested { api, code, .. } => {
            // `code` is None when the last window closed on its own
            if code.is_none() && !window::exit_when_last_window_closed() {
                info!("Last window closed, keeping the process alive");
                api.prevent_exit();
            }
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows,
            ..
        } => {
            if !has_visible_windows {
                reopen_main_window(app_handle);
            }
        }
        RunEvent::Exit => {
            info!("{} v{} exiting", APP_NAME, app_handle.package_info().version);
        }
        _ => {}
    });
}

/// Run `f` with a temporary INFO subscriber writing to `make_writer`
fn with_startup_logger<W, T>(make_writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn focus_main_window<R: Runtime>(app: &AppHandle<R>) {
    match app.try_state::<Arc<HostState>>() {
        Some(state) if state.window().has_window() => state.window().focus(),
        Some(_) => warn!("Main window is gone, nothing to focus"),
        None => warn!("Host state not ready, cannot focus main window"),
    }
}

/// Dock activation with no window left: bring the main window back
#[cfg(target_os = "macos")]
fn reopen_main_window<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<Arc<HostState>>() else {
        return;
    };
    if state.window().has_window() {
        state.window().focus();
        return;
    }

    let Some(ready) = app.try_state::<protocol::ResolverReady>() else {
        warn!("Resolver not active, cannot recreate main window");
        return;
    };
    match main_window::create(app, ready.inner(), state.inner()) {
        Ok(_) => info!("Main window recreated"),
        Err(e) => error!("Failed to recreate main window: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_warnings_are_logged_before_tracing_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();

        let config = with_startup_logger(move || writer.clone(), || HostConfig::load_from(&path));

        assert_eq!(config, HostConfig::default());
        let output = String::from_utf8_lossy(&buffer.0.lock()).to_string();
        assert!(output.contains("Ignoring malformed host config"));
    }
}
