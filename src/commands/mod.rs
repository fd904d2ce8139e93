//! IPC commands carrying the control channel
use std::sync::Arc;
use tauri::State;
use tracing::{debug, error};

use crate::channel::{ControlMessage, MessageKind, QueryReply};
use crate::error::ChannelError;
use crate::state::HostState;

/// Synchronous request/immediate-reply path. Only queries are accepted.
#[tauri::command]
pub fn control_query(
    state: State<'_, Arc<HostState>>,
    message: ControlMessage,
) -> Result<QueryReply, String> {
    debug!("control_query: {}", message.channel());
    state
        .query(&message)
        .map(|value| QueryReply { value })
        .map_err(|e| {
            error!("control_query rejected: {}", e);
            e.to_string()
        })
}

/// Fire-and-forget path. Returns before any launch work starts; requests
/// answer later through their reply events.
#[tauri::command]
pub fn control_send(
    state: State<'_, Arc<HostState>>,
    message: ControlMessage,
) -> Result<(), String> {
    debug!("control_send: {}", message.channel());
    dispatch(state.inner(), message).map_err(|e| {
        error!("control_send rejected: {}", e);
        e.to_string()
    })
}

fn dispatch(state: &Arc<HostState>, message: ControlMessage) -> Result<(), ChannelError> {
    match message.kind() {
        MessageKind::Query => Err(ChannelError::UnexpectedQuery(message.channel())),
        MessageKind::Command => state.run_command(&message),
        MessageKind::Request => {
            let state = state.clone();
            tauri::async_runtime::spawn(async move {
                state.run_request(message).await;
            });
            Ok(())
        }
    }
}
