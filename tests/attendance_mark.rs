
use serde_json::json;
use test_support::{create, mem_state, request_err, request_ok};

#[test]
fn mark_requires_an_existing_subject() {
    let mut state = mem_state();
    let code = request_err(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": "st1", "subjectId": "nope", "status": "absent" }),
    );
    assert_eq!(code, "not_found");

    // Nothing was persisted.
    let result = request_ok(&mut state, "2", "attendance.summary", json!({}));
    assert_eq!(result["records"].as_array().unwrap().len(), 0);
}

#[test]
fn mark_is_append_only_and_not_idempotent() {
    let mut state = mem_state();
    let subject_id = create(&mut state, "subjects", json!({ "name": "Mathematics" }));

    let params = json!({
        "studentId": "st1",
        "subjectId": subject_id,
        "status": "present",
        "date": "2026-03-10T08:00:00.000Z",
        "recordedBy": "prof-1"
    });
    let first = request_ok(&mut state, "1", "attendance.mark", params.clone());
    let second = request_ok(&mut state, "2", "attendance.mark", params);

    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();
    assert_ne!(first_id, second_id, "identical resubmission must append a second record");

    let result = request_ok(&mut state, "3", "attendance.summary", json!({}));
    assert_eq!(result["records"].as_array().unwrap().len(), 2);
}

#[test]
fn mark_rejects_unknown_status() {
    let mut state = mem_state();
    let subject_id = create(&mut state, "subjects", json!({ "name": "History" }));
    let code = request_err(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": "st1", "subjectId": subject_id, "status": "late" }),
    );
    assert_eq!(code, "bad_params");
}
