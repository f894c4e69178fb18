use serde::{Deserialize, Serialize};
use serde_json::Value;

// Collection names are part of the wire/storage contract and must not drift.
pub const USERS: &str = "users";
pub const STUDENTS: &str = "students";
pub const GRADES: &str = "grades";
pub const SUBJECTS: &str = "subjects";
pub const GRADE_SUBJECTS: &str = "grade_subjects";
pub const PROFESSOR_SUBJECTS: &str = "professor_subjects";
pub const TUTOR_STUDENT_RELATIONS: &str = "tutor_student_relations";
pub const ATTENDANCE: &str = "attendance";
pub const NOTIFICATIONS: &str = "notifications";

/// Closed role set. Stored as the lowercase string the original wire format
/// uses; unknown strings fail to parse rather than silently branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    Tutor,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "professor" => Some(Role::Professor),
            "tutor" => Some(Role::Tutor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::Tutor => "tutor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Justified,
}

impl AttendanceStatus {
    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "justified" => Some(AttendanceStatus::Justified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Justified => "justified",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GradeSubjectRelation {
    #[serde(default)]
    pub grade_id: String,
    #[serde(default)]
    pub subject_id: String,
    #[serde(default)]
    pub semester: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorSubjectRelation {
    #[serde(default)]
    pub professor_id: String,
    #[serde(default)]
    pub grade_subject_id: String,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub school_year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TutorStudentRelation {
    #[serde(default)]
    pub tutor_id: String,
    #[serde(default)]
    pub student_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub subject_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    pub recorded_by: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub student_id: String,
    pub tutor_id: String,
    pub message: String,
    pub kind: String,
    pub sent_at: String,
    pub read: bool,
}

/// Lenient field read: absent or non-string fields resolve to "".
pub fn str_field(doc: &Value, key: &str) -> String {
    doc.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Display name for a student document, matching how the original composes
/// it for notification messages. Falls back through `name` for documents
/// written by older clients.
pub fn student_display_name(doc: &Value) -> String {
    let first = str_field(doc, "firstName");
    let last = str_field(doc, "lastName");
    let full = format!("{} {}", first, last).trim().to_string();
    if full.is_empty() {
        str_field(doc, "name")
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parse_is_closed() {
        assert_eq!(Role::parse("tutor"), Some(Role::Tutor));
        assert_eq!(Role::parse("superadmin"), None);
        assert_eq!(Role::Professor.as_str(), "professor");
    }

    #[test]
    fn relation_docs_deserialize_leniently() {
        let rel: TutorStudentRelation =
            serde_json::from_value(json!({ "tutorId": "t1" })).unwrap();
        assert_eq!(rel.tutor_id, "t1");
        assert_eq!(rel.student_id, "");
    }

    #[test]
    fn student_display_name_falls_back() {
        assert_eq!(
            student_display_name(&json!({ "firstName": "Ana", "lastName": "Souza" })),
            "Ana Souza"
        );
        assert_eq!(student_display_name(&json!({ "name": "Ana" })), "Ana");
        assert_eq!(student_display_name(&json!({})), "");
    }
}
