/// External program and document launching
///
/// Both entry points are async: the control channel spawns them and turns the
/// outcome into a reply event, so a slow program only delays its own reply.
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{LaunchError, ResolveError};
use crate::resolver::resolve_file_under;
use crate::shell::SystemShell;

/// Stderr kept for the failure message; the rest is drained and dropped
const MAX_STDERR_BYTES: usize = 1024 * 1024;

/// Outcome reported to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LaunchResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

impl From<Result<(), LaunchError>> for LaunchResult {
    fn from(result: Result<(), LaunchError>) -> Self {
        match result {
            Ok(()) => LaunchResult::ok(),
            Err(e) => LaunchResult::failed(e.to_string()),
        }
    }
}

pub struct ExternalProcessLauncher {
    app_root: PathBuf,
    allowed_extensions: Vec<String>,
    shell: Arc<dyn SystemShell>,
}

impl ExternalProcessLauncher {
    pub fn new(
        app_root: PathBuf,
        allowed_extensions: Vec<String>,
        shell: Arc<dyn SystemShell>,
    ) -> Self {
        let allowed_extensions = allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            app_root,
            allowed_extensions,
            shell,
        }
    }

    /// Execute a program directly and wait for it to exit.
    /// The program runs with its own directory as working directory.
    pub async fn open_program(&self, path: &str) -> Result<(), LaunchError> {
        let program = PathBuf::from(path);
        info!("Launching program: {:?}", program);

        if !program.exists() {
            error!("Program not found: {:?}", program);
            return Err(LaunchError::ProgramNotFound(program));
        }
        self.check_allowed(&program)?;

        let program = absolutize(&program)?;
        let mut command = Command::new(&program);
        if let Some(dir) = program.parent() {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            error!("Failed to execute {:?}: {}", program, e);
            LaunchError::Failed(e.to_string())
        })?;

        let stderr = child.stderr.take();
        let (status, stderr) = tokio::join!(child.wait(), async move {
            match stderr {
                Some(stream) => read_capped(stream, MAX_STDERR_BYTES).await,
                None => Ok(Vec::new()),
            }
        });
        let status = status.map_err(|e| {
            error!("Failed to wait for {:?}: {}", program, e);
            LaunchError::Failed(e.to_string())
        })?;
        // A stderr read error only loses the diagnostic text
        let stderr = stderr.unwrap_or_default();

        if status.success() {
            info!("Program {:?} finished", program);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", program.display(), status)
        } else {
            stderr
        };
        error!("Program {:?} failed: {}", program, message);
        Err(LaunchError::Failed(message))
    }

    /// Open `path` inside `directory` (relative to the app root) with the
    /// default application for its type
    pub async fn open_document(&self, path: &str, directory: &str) -> Result<(), LaunchError> {
        let relative = if directory.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", directory, path)
        };
        info!("Opening document {} under {:?}", relative, self.app_root);

        let resolved = resolve_file_under(&self.app_root, &relative).map_err(|e| {
            error!("Cannot open document {}: {}", relative, e);
            match e {
                ResolveError::NotFound(_) => {
                    LaunchError::DocumentNotFound(self.app_root.join(directory).join(path))
                }
                ResolveError::AccessDenied(detail) => LaunchError::AccessDenied(detail),
                e @ ResolveError::Failed { .. } => LaunchError::Failed(e.to_string()),
            }
        })?;

        let shell = self.shell.clone();
        let target = resolved.clone();
        tokio::task::spawn_blocking(move || shell.open_path(&target))
            .await
            .map_err(|e| LaunchError::Failed(e.to_string()))?
            .map_err(|reason| {
                error!("Failed to open {:?}: {}", resolved, reason);
                LaunchError::Failed(reason)
            })?;

        info!("Opened {:?}", resolved);
        Ok(())
    }

    fn check_allowed(&self, program: &Path) -> Result<(), LaunchError> {
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }

        let extension = program
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if self.allowed_extensions.contains(&extension) {
            Ok(())
        } else {
            error!("Refusing to execute {:?}: extension not allowed", program);
            Err(LaunchError::AccessDenied(format!(
                "{} is not an allowed program type",
                program.display()
            )))
        }
    }
}

/// Read `reader` to the end, keeping at most `limit` bytes
async fn read_capped<R>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = limit.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, LaunchError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| LaunchError::Failed(e.to_string()))
}
