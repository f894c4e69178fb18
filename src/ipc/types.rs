use std::path::PathBuf;

use serde::Deserialize;

use crate::notify::NotificationPolicy;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Per-process state. The store handle is the only shared resource; it is
/// injected explicitly so tests can substitute an in-memory store.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn Store>>,
    pub policy: NotificationPolicy,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            store: None,
            policy: NotificationPolicy::default(),
        }
    }

    pub fn with_store(store: Box<dyn Store>, policy: NotificationPolicy) -> Self {
        AppState {
            workspace: None,
            store: Some(store),
            policy,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
