//! Control channel messages between the page and the host
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host → UI: the main window was maximized (`true`) or restored (`false`)
pub const WINDOW_STATE_CHANGED: &str = "window-state-changed";
/// Host → UI: `open-local-file` failed, payload is the message
pub const OPEN_LOCAL_FILE_ERROR: &str = "open-local-file-error";
/// Host → UI: outcome of `open-local-file-in-directory`
pub const OPEN_LOCAL_FILE_RESULT: &str = "open-local-file-result";

/// How a message is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Pure and fast, answered inline
    Query,
    /// Fire-and-forget, never answered
    Command,
    /// Runs in the background, answered by a later event
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryTarget {
    #[serde(alias = "filePath")]
    pub path: String,
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum ControlMessage {
    GetAppPath,
    CheckFileExists(String),
    WindowMinimize,
    WindowMaximize,
    WindowClose,
    WindowReload,
    OpenLocalFile(String),
    OpenLocalFileInDirectory(DirectoryTarget),
}

impl ControlMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ControlMessage::GetAppPath | ControlMessage::CheckFileExists(_) => MessageKind::Query,
            ControlMessage::WindowMinimize
            | ControlMessage::WindowMaximize
            | ControlMessage::WindowClose
            | ControlMessage::WindowReload => MessageKind::Command,
            ControlMessage::OpenLocalFile(_) | ControlMessage::OpenLocalFileInDirectory(_) => {
                MessageKind::Request
            }
        }
    }

    /// Wire name of the message
    pub fn channel(&self) -> &'static str {
        match self {
            ControlMessage::GetAppPath => "get-app-path",
            ControlMessage::CheckFileExists(_) => "check-file-exists",
            ControlMessage::WindowMinimize => "window-minimize",
            ControlMessage::WindowMaximize => "window-maximize",
            ControlMessage::WindowClose => "window-close",
            ControlMessage::WindowReload => "window-reload",
            ControlMessage::OpenLocalFile(_) => "open-local-file",
            ControlMessage::OpenLocalFileInDirectory(_) => "open-local-file-in-directory",
        }
    }
}

/// Immediate answer to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReply {
    pub value: Value,
}
