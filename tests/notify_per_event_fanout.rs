
use rollbookd::notify::NotificationPolicy;
use serde_json::json;
use test_support::{create, list_notifications, mem_state_with_policy, request_ok};

#[test]
fn every_event_fans_out_one_notification_per_tutor() {
    let mut state = mem_state_with_policy(NotificationPolicy::PerEventFanout);
    let subject_id = create(&mut state, "subjects", json!({ "name": "Mathematics" }));
    let student_id = create(&mut state, "students", json!({ "firstName": "Ana" }));
    let tutor1 = create(
        &mut state,
        "users",
        json!({ "displayName": "Tutor One", "role": "tutor" }),
    );
    let tutor2 = create(
        &mut state,
        "users",
        json!({ "displayName": "Tutor Two", "role": "tutor" }),
    );
    for (i, tutor) in [&tutor1, &tutor2].iter().enumerate() {
        request_ok(
            &mut state,
            &format!("rel-{}", i),
            "relations.create",
            json!({ "kind": "tutor_student", "tutorId": tutor, "studentId": student_id }),
        );
    }

    request_ok(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": student_id, "subjectId": subject_id, "status": "present" }),
    );

    let notifications = list_notifications(&mut state);
    assert_eq!(notifications.len(), 2);
    let mut tutor_ids: Vec<String> = notifications
        .iter()
        .map(|n| n["tutorId"].as_str().unwrap().to_string())
        .collect();
    tutor_ids.sort();
    let mut expected = vec![tutor1.clone(), tutor2.clone()];
    expected.sort();
    assert_eq!(tutor_ids, expected);
    for n in &notifications {
        assert_eq!(n["message"], "Your child was present in Mathematics");
        assert_eq!(n["kind"], "attendanceEvent");
        assert_eq!(n["studentId"], json!(student_id));
    }

    // A second event fans out again, regardless of status.
    request_ok(
        &mut state,
        "2",
        "attendance.mark",
        json!({ "studentId": student_id, "subjectId": subject_id, "status": "absent" }),
    );
    let notifications = list_notifications(&mut state);
    assert_eq!(notifications.len(), 4);
    assert!(notifications
        .iter()
        .any(|n| n["message"] == "Your child was absent in Mathematics"));
}

#[test]
fn relation_to_a_deleted_tutor_is_silently_skipped() {
    let mut state = mem_state_with_policy(NotificationPolicy::PerEventFanout);
    let subject_id = create(&mut state, "subjects", json!({ "name": "History" }));
    let student_id = create(&mut state, "students", json!({ "firstName": "Bruno" }));
    let tutor = create(&mut state, "users", json!({ "displayName": "T", "role": "tutor" }));
    request_ok(
        &mut state,
        "rel",
        "relations.create",
        json!({ "kind": "tutor_student", "tutorId": tutor, "studentId": student_id }),
    );
    request_ok(&mut state, "del", "users.delete", json!({ "id": tutor }));

    request_ok(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": student_id, "subjectId": subject_id, "status": "absent" }),
    );
    assert_eq!(list_notifications(&mut state).len(), 0);
}

#[test]
fn unnamed_subject_degrades_to_a_placeholder_in_the_message() {
    let mut state = mem_state_with_policy(NotificationPolicy::PerEventFanout);
    // Subject document exists (the mark precondition) but carries no name.
    let subject_id = create(&mut state, "subjects", json!({}));
    let student_id = create(&mut state, "students", json!({ "firstName": "Clara" }));
    let tutor = create(&mut state, "users", json!({ "displayName": "T", "role": "tutor" }));
    request_ok(
        &mut state,
        "rel",
        "relations.create",
        json!({ "kind": "tutor_student", "tutorId": tutor, "studentId": student_id }),
    );

    request_ok(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": student_id, "subjectId": subject_id, "status": "justified" }),
    );
    let notifications = list_notifications(&mut state);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["message"], "Your child was justified in class");
}
