//! Read-only denormalized views: the attendance summary (every record
//! flattened with student/subject names resolved) and the paginated
//! collection listing.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::CoreError;
use crate::model::{self, str_field};
use crate::store::{Filter, Store};

pub const MAX_PAGE_SIZE: usize = 100;

/// Flatten every attendance record, resolving student and subject by id.
/// Dangling references resolve to empty-string fields; the summary never
/// fails because a referenced document is gone.
pub fn attendance_summary(store: &dyn Store) -> Result<Vec<Value>, CoreError> {
    let students: HashMap<String, Value> = store
        .scan(model::STUDENTS, &Filter::new())?
        .into_iter()
        .map(|d| (d.id, d.doc))
        .collect();
    let subjects: HashMap<String, Value> = store
        .scan(model::SUBJECTS, &Filter::new())?
        .into_iter()
        .map(|d| (d.id, d.doc))
        .collect();

    let mut rows = Vec::new();
    for record in store.scan(model::ATTENDANCE, &Filter::new())? {
        let student_id = str_field(&record.doc, "studentId");
        let subject_id = str_field(&record.doc, "subjectId");
        let (student_name, grade_id) = match students.get(&student_id) {
            Some(doc) => (model::student_display_name(doc), str_field(doc, "gradeId")),
            None => (String::new(), String::new()),
        };
        let subject_name = subjects
            .get(&subject_id)
            .map(|doc| str_field(doc, "name"))
            .unwrap_or_default();

        rows.push(json!({
            "id": record.id,
            "studentId": student_id,
            "studentName": student_name,
            "gradeId": grade_id,
            "subjectId": subject_id,
            "subjectName": subject_name,
            "status": str_field(&record.doc, "status"),
            "date": str_field(&record.doc, "date"),
            "justification": str_field(&record.doc, "justification"),
        }));
    }
    Ok(rows)
}

/// Offset pagination over one collection, in stable id order. `pageSize` is
/// clamped to [1, 100] and `page` to >= 1; cost is O(offset + pageSize) per
/// call. When `after_id` is given the listing switches to keyset form
/// (items strictly after the last-seen id), which stays stable under
/// concurrent inserts.
pub fn paginated(
    store: &dyn Store,
    collection: &str,
    page: usize,
    page_size: usize,
    after_id: Option<&str>,
) -> Result<Value, CoreError> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

    let docs = store.scan(collection, &Filter::new())?;
    let items: Vec<Value> = match after_id {
        Some(after) => docs
            .iter()
            .filter(|d| d.id.as_str() > after)
            .take(page_size)
            .map(|d| merge_id(&d.id, &d.doc))
            .collect(),
        None => docs
            .iter()
            // `page` is client-controlled; the offset must not overflow.
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(|d| merge_id(&d.id, &d.doc))
            .collect(),
    };

    let next_after_id = items
        .last()
        .and_then(|v| v.get("id"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(json!({
        "page": page,
        "pageSize": page_size,
        "items": items,
        "nextAfterId": next_after_id,
    }))
}

fn merge_id(id: &str, doc: &Value) -> Value {
    let mut merged = json!({ "id": id });
    if let (Some(obj), Some(doc_obj)) = (merged.as_object_mut(), doc.as_object()) {
        for (k, v) in doc_obj {
            obj.insert(k.clone(), v.clone());
        }
    }
    merged
}
