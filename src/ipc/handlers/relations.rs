use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::relations::{self, RelationKind};
use serde_json::json;

fn handle_create(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let kind_raw = get_required_str(&req.params, "kind")?;
    let kind = RelationKind::parse(&kind_raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("unknown relation kind: {}", kind_raw))
    })?;
    let id = relations::create_relation(store, kind, &req.params)?;
    Ok(json!({ "id": id, "message": "created" }))
}

fn handle_students_by_grade(
    state: &AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let grade_id = get_required_str(&req.params, "gradeId")?;
    let students: Vec<serde_json::Value> = relations::students_by_grade(store, &grade_id)?
        .iter()
        .map(|d| {
            let mut merged = json!({ "id": d.id });
            if let (Some(obj), Some(doc_obj)) = (merged.as_object_mut(), d.doc.as_object()) {
                for (k, v) in doc_obj {
                    obj.insert(k.clone(), v.clone());
                }
            }
            merged
        })
        .collect();
    Ok(json!({ "students": students }))
}

fn handle_available_options(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    Ok(relations::available_options(store)?)
}

fn handle_detailed(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    Ok(relations::detailed(store)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "relations.create" => handle_create(state, req),
        "relations.studentsByGrade" => handle_students_by_grade(state, req),
        "relations.availableOptions" => handle_available_options(state),
        "relations.detailed" => handle_detailed(state),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
