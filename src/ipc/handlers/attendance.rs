use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_str, require_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{self, AttendanceRecord, AttendanceStatus};
use crate::notify;
use crate::summary;
use serde_json::json;

/// Mark one attendance event, then run the notification policy. The record
/// write and the notification write are not one atomic unit: a notification
/// failure surfaces as partial success (`notificationError`) and never
/// reverts the attendance record.
fn handle_mark(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let subject_id = get_required_str(&req.params, "subjectId")?;
    let status_raw = get_required_str(&req.params, "status")?;
    let status = AttendanceStatus::parse(&status_raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("unknown status: {}", status_raw))
    })?;

    let subject_exists = store
        .get(model::SUBJECTS, &subject_id)
        .map_err(crate::error::CoreError::from)?
        .is_some();
    if !subject_exists {
        return Err(HandlerErr {
            code: "not_found",
            message: "subject not found".to_string(),
            details: None,
        });
    }

    let now = notify::now_rfc3339();
    let record = AttendanceRecord {
        student_id: student_id.clone(),
        subject_id: subject_id.clone(),
        date: get_optional_str(&req.params, "date").unwrap_or_else(|| now.clone()),
        status,
        justification: get_optional_str(&req.params, "justification"),
        recorded_by: get_optional_str(&req.params, "recordedBy").unwrap_or_default(),
        recorded_at: now,
    };
    let doc = serde_json::to_value(&record)
        .map_err(|e| crate::error::CoreError::Upstream(e.to_string()))?;
    let id = store
        .insert(model::ATTENDANCE, &doc)
        .map_err(crate::error::CoreError::from)?;

    // No idempotency key: an identical resubmission appends a second record.
    match notify::run(store, state.policy, &student_id, &subject_id, status) {
        Ok(messages) if messages.is_empty() => Ok(json!({
            "id": id,
            "message": "Attendance marked successfully",
        })),
        Ok(messages) => Ok(json!({
            "id": id,
            "message": "Attendance marked and notification sent",
            "notifications": messages,
        })),
        Err(e) => Ok(json!({
            "id": id,
            "message": "Attendance marked successfully",
            "notificationError": e.to_string(),
        })),
    }
}

fn handle_summary(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let records = summary::attendance_summary(store)?;
    Ok(json!({ "records": records }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.mark" => handle_mark(state, req),
        "attendance.summary" => handle_summary(state),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
