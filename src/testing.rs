//! Recording fakes for the shell, event and window seams
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::shell::SystemShell;
use crate::window::{EventSink, WindowControl};

#[derive(Default)]
pub struct RecordingShell {
    urls: Mutex<Vec<String>>,
    paths: Mutex<Vec<PathBuf>>,
    failure: Option<String>,
}

impl RecordingShell {
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    fn outcome(&self) -> Result<(), String> {
        match &self.failure {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

impl SystemShell for RecordingShell {
    fn open_external(&self, url: &str) -> Result<(), String> {
        self.urls.lock().push(url.to_string());
        self.outcome()
    }

    fn open_path(&self, path: &Path) -> Result<(), String> {
        self.paths.lock().push(path.to_path_buf());
        self.outcome()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<Value> {
        self.events
            .lock()
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &str, payload: Value) -> Result<(), String> {
        self.events.lock().push((event.to_string(), payload));
        Ok(())
    }
}

/// In-memory window; `closed` makes every call fail like a destroyed handle
#[derive(Default)]
pub struct FakeWindow {
    pub maximized: Mutex<bool>,
    pub minimized: Mutex<bool>,
    pub closed: Mutex<bool>,
    pub reloads: Mutex<usize>,
    pub focused: Mutex<bool>,
}

impl FakeWindow {
    fn alive(&self) -> Result<(), String> {
        if *self.closed.lock() {
            Err("window destroyed".to_string())
        } else {
            Ok(())
        }
    }
}

impl WindowControl for FakeWindow {
    fn is_maximized(&self) -> Result<bool, String> {
        self.alive()?;
        Ok(*self.maximized.lock())
    }

    fn maximize(&self) -> Result<(), String> {
        self.alive()?;
        *self.maximized.lock() = true;
        Ok(())
    }

    fn unmaximize(&self) -> Result<(), String> {
        self.alive()?;
        *self.maximized.lock() = false;
        Ok(())
    }

    fn minimize(&self) -> Result<(), String> {
        self.alive()?;
        *self.minimized.lock() = true;
        Ok(())
    }

    fn close(&self) -> Result<(), String> {
        self.alive()?;
        *self.closed.lock() = true;
        Ok(())
    }

    fn focus(&self) -> Result<(), String> {
        self.alive()?;
        *self.minimized.lock() = false;
        *self.focused.lock() = true;
        Ok(())
    }

    fn reload(&self) -> Result<(), String> {
        self.alive()?;
        *self.reloads.lock() += 1;
        Ok(())
    }
}
