
use serde_json::json;
use test_support::{create, mem_state, request_err, request_ok};

#[test]
fn tutor_dashboard_unions_grades_and_subjects_without_duplicates() {
    let mut state = mem_state();
    let grade1 = create(&mut state, "grades", json!({ "name": "5th", "shift": "morning" }));
    let grade2 = create(&mut state, "grades", json!({ "name": "6th", "shift": "morning" }));
    let math = create(&mut state, "subjects", json!({ "name": "Mathematics" }));
    let arts = create(&mut state, "subjects", json!({ "name": "Arts" }));
    let science = create(&mut state, "subjects", json!({ "name": "Science" }));

    // grade1 teaches math+arts, grade2 teaches arts+science: arts is shared.
    for (i, (grade, subject)) in [
        (&grade1, &math),
        (&grade1, &arts),
        (&grade2, &arts),
        (&grade2, &science),
    ]
    .iter()
    .enumerate()
    {
        request_ok(
            &mut state,
            &format!("gs-{}", i),
            "relations.create",
            json!({ "kind": "grade_subject", "gradeId": grade, "subjectId": subject, "semester": "2026-1" }),
        );
    }

    let student1 = create(
        &mut state,
        "students",
        json!({ "firstName": "Ana", "gradeId": grade1 }),
    );
    let student2 = create(
        &mut state,
        "students",
        json!({ "firstName": "Bruno", "gradeId": grade2 }),
    );
    let tutor = create(
        &mut state,
        "users",
        json!({ "displayName": "Tutor", "role": "tutor" }),
    );
    for (i, student) in [&student1, &student2].iter().enumerate() {
        request_ok(
            &mut state,
            &format!("ts-{}", i),
            "relations.create",
            json!({ "kind": "tutor_student", "tutorId": tutor, "studentId": student }),
        );
    }

    let info = request_ok(&mut state, "1", "user.info", json!({ "userId": tutor }));
    assert_eq!(info["role"], "tutor");
    assert_eq!(info["students"].as_array().unwrap().len(), 2);
    assert_eq!(info["grades"].as_array().unwrap().len(), 2);
    let subjects = info["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 3, "shared subject must appear once");
    assert_eq!(info["notifications"].as_array().unwrap().len(), 0);
}

#[test]
fn tutor_dashboard_includes_their_notifications() {
    // Fan-out policy so the mark produces a tutor-addressed notification.
    let mut state = test_support::mem_state_with_policy(
        rollbookd::notify::NotificationPolicy::PerEventFanout,
    );
    let subject = create(&mut state, "subjects", json!({ "name": "Math" }));
    let student = create(&mut state, "students", json!({ "firstName": "Ana" }));
    let tutor = create(&mut state, "users", json!({ "displayName": "T", "role": "tutor" }));
    request_ok(
        &mut state,
        "rel",
        "relations.create",
        json!({ "kind": "tutor_student", "tutorId": tutor, "studentId": student }),
    );

    request_ok(
        &mut state,
        "1",
        "attendance.mark",
        json!({ "studentId": student, "subjectId": subject, "status": "absent" }),
    );

    let info = request_ok(&mut state, "2", "user.info", json!({ "userId": tutor }));
    let notifications = info["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["tutorId"], json!(tutor));
}

#[test]
fn professor_dashboard_reaches_grades_and_subjects_through_assignments() {
    let mut state = mem_state();
    let grade = create(&mut state, "grades", json!({ "name": "7th" }));
    let subject = create(&mut state, "subjects", json!({ "name": "Chemistry" }));
    let gs = request_ok(
        &mut state,
        "gs",
        "relations.create",
        json!({ "kind": "grade_subject", "gradeId": grade, "subjectId": subject, "semester": "2026-1" }),
    );
    let gs_id = gs["id"].as_str().unwrap().to_string();

    let professor = create(
        &mut state,
        "users",
        json!({ "displayName": "Prof", "role": "professor" }),
    );
    request_ok(
        &mut state,
        "ps",
        "relations.create",
        json!({
            "kind": "professor_subject",
            "professorId": professor,
            "gradeSubjectId": gs_id,
            "shift": "morning",
            "schoolYear": "2026"
        }),
    );

    let info = request_ok(&mut state, "1", "user.info", json!({ "userId": professor }));
    assert_eq!(info["role"], "professor");
    assert_eq!(info["assignments"].as_array().unwrap().len(), 1);
    assert_eq!(info["grades"].as_array().unwrap().len(), 1);
    assert_eq!(info["grades"][0]["name"], "7th");
    assert_eq!(info["subjects"].as_array().unwrap().len(), 1);
    assert_eq!(info["subjects"][0]["name"], "Chemistry");
}

#[test]
fn admin_dashboard_is_the_user_record_alone() {
    let mut state = mem_state();
    let admin = create(
        &mut state,
        "users",
        json!({ "displayName": "Root", "role": "admin" }),
    );
    let info = request_ok(&mut state, "1", "user.info", json!({ "userId": admin }));
    assert_eq!(info["role"], "admin");
    assert_eq!(info["user"]["displayName"], "Root");
    assert!(info.get("grades").is_none());
    assert!(info.get("notifications").is_none());
}

#[test]
fn user_info_for_a_missing_user_is_not_found() {
    let mut state = mem_state();
    let code = request_err(&mut state, "1", "user.info", json!({ "userId": "nobody" }));
    assert_eq!(code, "not_found");
}
