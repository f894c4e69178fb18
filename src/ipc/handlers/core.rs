use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::notify::NotificationPolicy;
use crate::store::SqliteStore;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let policy = match req.params.get("notificationPolicy").and_then(|v| v.as_str()) {
        Some(raw) => match NotificationPolicy::parse(raw) {
            Some(p) => p,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("unknown notificationPolicy: {}", raw),
                    None,
                )
            }
        },
        None => NotificationPolicy::default(),
    };

    match SqliteStore::open(&path) {
        Ok(store) => {
            state.workspace = Some(path.clone());
            state.store = Some(Box::new(store));
            state.policy = policy;
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy().to_string() }),
            )
        }
        Err(e) => err(&req.id, "upstream_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
