use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a failed virtual resource resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("failed to resolve {path}: {reason}")]
    Failed { path: String, reason: String },
}

impl ResolveError {
    /// HTTP status handed back to the webview for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::NotFound(_) => 404,
            ResolveError::AccessDenied(_) => 403,
            ResolveError::Failed { .. } => 500,
        }
    }

    pub(crate) fn failed(path: impl Into<String>, reason: impl ToString) -> Self {
        ResolveError::Failed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures reported back to the UI by the process launcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("Program file not found: {}", .0.display())]
    ProgramNotFound(PathBuf),

    #[error("File not found in directory: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Failed(String),
}

/// The host cannot work out where its assets live. Aborts startup.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("cannot determine install location: {0}")]
    InstallLocation(String),

    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("'{0}' is not a query and has no immediate reply")]
    NotAQuery(&'static str),

    #[error("'{0}' is a query; send it through control_query")]
    UnexpectedQuery(&'static str),
}
