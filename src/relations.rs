//! Relation resolver: rebuilds the associations the store has no joins for
//! (tutor-student, grade-subject, professor-subject-grade) by filtered scans
//! plus per-id lookups, and enforces composite-key uniqueness on insert.
//!
//! Join policy is lenient throughout: a relation whose referenced document no
//! longer resolves is skipped (set-valued reads) or rendered with empty-string
//! fields (display reads), never an error.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::CoreError;
use crate::model::{
    self, str_field, GradeSubjectRelation, ProfessorSubjectRelation, Role, TutorStudentRelation,
};
use crate::store::{Document, Filter, Store};

pub fn students_by_grade(store: &dyn Store, grade_id: &str) -> Result<Vec<Document>, CoreError> {
    Ok(store.scan(model::STUDENTS, &Filter::new().eq("gradeId", grade_id))?)
}

/// Tutors linked to a student, resolved to user documents. Relations whose
/// tutor no longer exists are silently skipped.
pub fn tutors_for_student(store: &dyn Store, student_id: &str) -> Result<Vec<Document>, CoreError> {
    let rels = store.scan(
        model::TUTOR_STUDENT_RELATIONS,
        &Filter::new().eq("studentId", student_id),
    )?;
    let mut tutors = Vec::new();
    for rel in rels {
        let parsed: TutorStudentRelation =
            serde_json::from_value(rel.doc).unwrap_or_default();
        if parsed.tutor_id.is_empty() {
            continue;
        }
        if let Some(doc) = store.get(model::USERS, &parsed.tutor_id)? {
            tutors.push(Document {
                id: parsed.tutor_id,
                doc,
            });
        }
    }
    Ok(tutors)
}

/// Subjects taught in a grade, with the semester each relation names.
/// Relations pointing at a deleted subject are skipped.
pub fn subjects_for_grade(
    store: &dyn Store,
    grade_id: &str,
) -> Result<Vec<(Document, String)>, CoreError> {
    let rels = store.scan(
        model::GRADE_SUBJECTS,
        &Filter::new().eq("gradeId", grade_id),
    )?;
    let mut out = Vec::new();
    for rel in rels {
        let parsed: GradeSubjectRelation =
            serde_json::from_value(rel.doc).unwrap_or_default();
        if parsed.subject_id.is_empty() {
            continue;
        }
        if let Some(doc) = store.get(model::SUBJECTS, &parsed.subject_id)? {
            out.push((
                Document {
                    id: parsed.subject_id,
                    doc,
                },
                parsed.semester,
            ));
        }
    }
    Ok(out)
}

pub fn assignments_for_professor(
    store: &dyn Store,
    professor_id: &str,
) -> Result<Vec<Document>, CoreError> {
    Ok(store.scan(
        model::PROFESSOR_SUBJECTS,
        &Filter::new().eq("professorId", professor_id),
    )?)
}

/// The three relation kinds and their composite keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    GradeSubject,
    ProfessorSubject,
    TutorStudent,
}

impl RelationKind {
    pub fn parse(s: &str) -> Option<RelationKind> {
        match s {
            "grade_subject" => Some(RelationKind::GradeSubject),
            "professor_subject" => Some(RelationKind::ProfessorSubject),
            "tutor_student" => Some(RelationKind::TutorStudent),
            _ => None,
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            RelationKind::GradeSubject => model::GRADE_SUBJECTS,
            RelationKind::ProfessorSubject => model::PROFESSOR_SUBJECTS,
            RelationKind::TutorStudent => model::TUTOR_STUDENT_RELATIONS,
        }
    }

    pub fn key_fields(&self) -> &'static [&'static str] {
        match self {
            RelationKind::GradeSubject => &["gradeId", "subjectId", "semester"],
            RelationKind::ProfessorSubject => {
                &["professorId", "gradeSubjectId", "shift", "schoolYear"]
            }
            RelationKind::TutorStudent => &["tutorId", "studentId"],
        }
    }
}

/// Insert a relation unless a document with the identical composite key
/// already exists. The check is an equality-filtered scan immediately before
/// the insert; the store has no unique constraints, so concurrent duplicate
/// submissions can still race (known limitation).
pub fn create_relation(
    store: &dyn Store,
    kind: RelationKind,
    params: &Value,
) -> Result<String, CoreError> {
    let mut filter = Filter::new();
    let mut doc = serde_json::Map::new();
    for field in kind.key_fields() {
        let value = params
            .get(*field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::BadParams(format!("missing {}", field)))?;
        filter = filter.eq(field, value);
        doc.insert(field.to_string(), Value::String(value.to_string()));
    }

    let existing = store.scan(kind.collection(), &filter)?;
    if !existing.is_empty() {
        return Err(CoreError::Conflict("relation already exists".to_string()));
    }
    Ok(store.insert(kind.collection(), &Value::Object(doc))?)
}

fn option_list(docs: Vec<Document>, name_of: impl Fn(&Value) -> String) -> Vec<Value> {
    docs.iter()
        .map(|d| json!({ "id": d.id, "name": name_of(&d.doc) }))
        .collect()
}

/// Option lists for building new relations: every grade, subject and student,
/// plus users split by role.
pub fn available_options(store: &dyn Store) -> Result<Value, CoreError> {
    let grades = store.scan(model::GRADES, &Filter::new())?;
    let subjects = store.scan(model::SUBJECTS, &Filter::new())?;
    let students = store.scan(model::STUDENTS, &Filter::new())?;
    let professors = store.scan(model::USERS, &Filter::new().eq("role", "professor"))?;
    let tutors = store.scan(model::USERS, &Filter::new().eq("role", "tutor"))?;

    Ok(json!({
        "grades": option_list(grades, |d| str_field(d, "name")),
        "subjects": option_list(subjects, |d| str_field(d, "name")),
        "students": option_list(students, model::student_display_name),
        "professors": option_list(professors, |d| str_field(d, "displayName")),
        "tutors": option_list(tutors, |d| str_field(d, "displayName")),
    }))
}

fn name_by_id(store: &dyn Store, collection: &str, id: &str, field: &str) -> Result<String, CoreError> {
    if id.is_empty() {
        return Ok(String::new());
    }
    Ok(store
        .get(collection, id)?
        .map(|doc| str_field(&doc, field))
        .unwrap_or_default())
}

/// Every relation resolved to display form, with empty-string names where a
/// referenced document is gone.
pub fn detailed(store: &dyn Store) -> Result<Value, CoreError> {
    let mut grade_subjects = Vec::new();
    for rel in store.scan(model::GRADE_SUBJECTS, &Filter::new())? {
        let parsed: GradeSubjectRelation = serde_json::from_value(rel.doc).unwrap_or_default();
        grade_subjects.push(json!({
            "id": rel.id,
            "gradeId": parsed.grade_id,
            "gradeName": name_by_id(store, model::GRADES, &parsed.grade_id, "name")?,
            "subjectId": parsed.subject_id,
            "subjectName": name_by_id(store, model::SUBJECTS, &parsed.subject_id, "name")?,
            "semester": parsed.semester,
        }));
    }

    let mut professor_subjects = Vec::new();
    for rel in store.scan(model::PROFESSOR_SUBJECTS, &Filter::new())? {
        let parsed: ProfessorSubjectRelation =
            serde_json::from_value(rel.doc).unwrap_or_default();
        // The grade-subject hop resolves through the other relation table.
        let (grade_name, subject_name, semester) =
            match store.get(model::GRADE_SUBJECTS, &parsed.grade_subject_id)? {
                Some(gs_doc) => {
                    let gs: GradeSubjectRelation =
                        serde_json::from_value(gs_doc).unwrap_or_default();
                    (
                        name_by_id(store, model::GRADES, &gs.grade_id, "name")?,
                        name_by_id(store, model::SUBJECTS, &gs.subject_id, "name")?,
                        gs.semester,
                    )
                }
                None => (String::new(), String::new(), String::new()),
            };
        professor_subjects.push(json!({
            "id": rel.id,
            "professorId": parsed.professor_id,
            "professorName": name_by_id(store, model::USERS, &parsed.professor_id, "displayName")?,
            "gradeSubjectId": parsed.grade_subject_id,
            "gradeName": grade_name,
            "subjectName": subject_name,
            "semester": semester,
            "shift": parsed.shift,
            "schoolYear": parsed.school_year,
        }));
    }

    let mut tutor_students = Vec::new();
    for rel in store.scan(model::TUTOR_STUDENT_RELATIONS, &Filter::new())? {
        let parsed: TutorStudentRelation = serde_json::from_value(rel.doc).unwrap_or_default();
        let student_name = match store.get(model::STUDENTS, &parsed.student_id)? {
            Some(doc) => model::student_display_name(&doc),
            None => String::new(),
        };
        tutor_students.push(json!({
            "id": rel.id,
            "tutorId": parsed.tutor_id,
            "tutorName": name_by_id(store, model::USERS, &parsed.tutor_id, "displayName")?,
            "studentId": parsed.student_id,
            "studentName": student_name,
        }));
    }

    Ok(json!({
        "gradeSubjects": grade_subjects,
        "professorSubjects": professor_subjects,
        "tutorStudents": tutor_students,
    }))
}

fn with_id(id: &str, doc: &Value) -> Value {
    let mut merged = json!({ "id": id });
    if let (Some(obj), Some(doc_obj)) = (merged.as_object_mut(), doc.as_object()) {
        for (k, v) in doc_obj {
            obj.insert(k.clone(), v.clone());
        }
    }
    merged
}

/// Role-polymorphic dashboard. Dispatch is over the closed `Role` set; a user
/// document with an unrecognized role is treated as a plain record view.
pub fn dashboard_for(store: &dyn Store, user_id: &str) -> Result<Value, CoreError> {
    let Some(user) = store.get(model::USERS, user_id)? else {
        return Err(CoreError::NotFound("user not found".to_string()));
    };
    let role = Role::parse(&str_field(&user, "role"));
    let user_view = with_id(user_id, &user);

    match role {
        Some(Role::Tutor) => {
            // Union of grades/subjects reachable through each linked student,
            // deduplicated by id, plus this tutor's notifications.
            let mut grades: BTreeMap<String, Value> = BTreeMap::new();
            let mut subjects: BTreeMap<String, Value> = BTreeMap::new();
            let mut students = Vec::new();

            let rels = store.scan(
                model::TUTOR_STUDENT_RELATIONS,
                &Filter::new().eq("tutorId", user_id),
            )?;
            for rel in rels {
                let parsed: TutorStudentRelation =
                    serde_json::from_value(rel.doc).unwrap_or_default();
                let Some(student) = store.get(model::STUDENTS, &parsed.student_id)? else {
                    continue;
                };
                let grade_id = str_field(&student, "gradeId");
                students.push(with_id(&parsed.student_id, &student));
                if grade_id.is_empty() {
                    continue;
                }
                if let Some(grade) = store.get(model::GRADES, &grade_id)? {
                    grades.insert(grade_id.clone(), with_id(&grade_id, &grade));
                }
                for (subject, semester) in subjects_for_grade(store, &grade_id)? {
                    let mut view = with_id(&subject.id, &subject.doc);
                    view["semester"] = Value::String(semester);
                    subjects.insert(subject.id, view);
                }
            }

            let notifications: Vec<Value> = store
                .scan(model::NOTIFICATIONS, &Filter::new().eq("tutorId", user_id))?
                .iter()
                .map(|n| with_id(&n.id, &n.doc))
                .collect();

            Ok(json!({
                "role": "tutor",
                "user": user_view,
                "students": students,
                "grades": grades.into_values().collect::<Vec<_>>(),
                "subjects": subjects.into_values().collect::<Vec<_>>(),
                "notifications": notifications,
            }))
        }
        Some(Role::Professor) => {
            let mut grades: BTreeMap<String, Value> = BTreeMap::new();
            let mut subjects: BTreeMap<String, Value> = BTreeMap::new();
            let mut assignments = Vec::new();

            for rel in assignments_for_professor(store, user_id)? {
                let parsed: ProfessorSubjectRelation =
                    serde_json::from_value(rel.doc.clone()).unwrap_or_default();
                assignments.push(with_id(&rel.id, &rel.doc));
                let Some(gs_doc) =
                    store.get(model::GRADE_SUBJECTS, &parsed.grade_subject_id)?
                else {
                    continue;
                };
                let gs: GradeSubjectRelation =
                    serde_json::from_value(gs_doc).unwrap_or_default();
                if let Some(grade) = store.get(model::GRADES, &gs.grade_id)? {
                    grades.insert(gs.grade_id.clone(), with_id(&gs.grade_id, &grade));
                }
                if let Some(subject) = store.get(model::SUBJECTS, &gs.subject_id)? {
                    subjects.insert(gs.subject_id.clone(), with_id(&gs.subject_id, &subject));
                }
            }

            Ok(json!({
                "role": "professor",
                "user": user_view,
                "assignments": assignments,
                "grades": grades.into_values().collect::<Vec<_>>(),
                "subjects": subjects.into_values().collect::<Vec<_>>(),
            }))
        }
        Some(Role::Admin) | None => Ok(json!({
            "role": str_field(&user_view, "role"),
            "user": user_view,
        })),
    }
}
