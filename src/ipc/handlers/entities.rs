//! Uniform CRUD over the four entity collections. Documents are stored
//! as-is: the store is schemaless and field formats are deliberately
//! unvalidated (emails, dates and shifts are free strings).

use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model;
use crate::store::{Filter, Store};
use serde_json::{json, Value};

fn collection_for(prefix: &str) -> Option<&'static str> {
    match prefix {
        "users" => Some(model::USERS),
        "students" => Some(model::STUDENTS),
        "grades" => Some(model::GRADES),
        "subjects" => Some(model::SUBJECTS),
        _ => None,
    }
}

fn doc_from_params(params: &Value) -> Result<Value, HandlerErr> {
    let Some(obj) = params.as_object() else {
        return Err(HandlerErr::bad_params("params must be an object"));
    };
    // The store assigns ids; a client-supplied one is dropped rather than
    // trusted.
    let mut doc = obj.clone();
    doc.remove("id");
    Ok(Value::Object(doc))
}

fn create(store: &dyn Store, collection: &str, params: &Value) -> Result<Value, HandlerErr> {
    let doc = doc_from_params(params)?;
    let id = store
        .insert(collection, &doc)
        .map_err(crate::error::CoreError::from)?;
    Ok(json!({ "id": id, "message": "created" }))
}

fn list(store: &dyn Store, collection: &str) -> Result<Value, HandlerErr> {
    let items: Vec<Value> = store
        .scan(collection, &Filter::new())
        .map_err(crate::error::CoreError::from)?
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
    Ok(json!({ "items": items }))
}

fn get(store: &dyn Store, collection: &str, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match store
        .get(collection, &id)
        .map_err(crate::error::CoreError::from)?
    {
        Some(mut doc) => {
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("id".to_string(), Value::String(id));
            }
            Ok(doc)
        }
        None => Err(HandlerErr {
            code: "not_found",
            message: format!("{} document not found", collection),
            details: None,
        }),
    }
}

fn update(store: &dyn Store, collection: &str, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let existing = store
        .get(collection, &id)
        .map_err(crate::error::CoreError::from)?;
    if existing.is_none() {
        return Err(HandlerErr {
            code: "not_found",
            message: format!("{} document not found", collection),
            details: None,
        });
    }
    let doc = params
        .get("doc")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing doc"))?;
    let doc = doc_from_params(&doc)?;
    store
        .put(collection, &id, &doc)
        .map_err(crate::error::CoreError::from)?;
    Ok(json!({ "message": "updated" }))
}

fn delete(store: &dyn Store, collection: &str, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let removed = store
        .delete(collection, &id)
        .map_err(crate::error::CoreError::from)?;
    if !removed {
        return Err(HandlerErr {
            code: "not_found",
            message: format!("{} document not found", collection),
            details: None,
        });
    }
    Ok(json!({ "message": "deleted" }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (prefix, op) = req.method.split_once('.')?;
    let collection = collection_for(prefix)?;

    let result = (|| {
        let store = require_store(&state.store)?;
        match op {
            "create" => create(store, collection, &req.params),
            "list" => list(store, collection),
            "get" => get(store, collection, &req.params),
            "update" => update(store, collection, &req.params),
            "delete" => delete(store, collection, &req.params),
            _ => Err(HandlerErr {
                code: "not_implemented",
                message: format!("unknown method: {}", req.method),
                details: None,
            }),
        }
    })();

    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
