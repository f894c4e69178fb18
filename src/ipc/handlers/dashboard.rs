use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_str, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::relations;
use crate::summary;

fn handle_user_info(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user_id = get_required_str(&req.params, "userId")?;
    Ok(relations::dashboard_for(store, &user_id)?)
}

fn handle_paginated(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let collection = get_required_str(&req.params, "collection")?;
    let page = req
        .params
        .get("page")
        .and_then(|v| v.as_u64())
        .unwrap_or(1) as usize;
    let page_size = req
        .params
        .get("pageSize")
        .and_then(|v| v.as_u64())
        .unwrap_or(20) as usize;
    let after_id = get_optional_str(&req.params, "afterId");
    Ok(summary::paginated(
        store,
        &collection,
        page,
        page_size,
        after_id.as_deref(),
    )?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "user.info" => handle_user_info(state, req),
        "collection.paginated" => handle_paginated(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
