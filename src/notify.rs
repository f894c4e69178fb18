//! Notification trigger engine. Two historically observed policies exist and
//! are kept as explicit, separate strategies: a windowed absence threshold
//! (one aggregate notification when a student reaches 3 absences inside the
//! trailing week) and a per-event fan-out to every tutor linked to the
//! student. The active policy is chosen at workspace selection; they are
//! never combined.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{self, str_field, AttendanceStatus, NotificationRecord};
use crate::relations;
use crate::store::{Filter, Store};

pub const ABSENCE_THRESHOLD: i64 = 3;
pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPolicy {
    WindowedThreshold,
    PerEventFanout,
}

impl NotificationPolicy {
    pub fn parse(s: &str) -> Option<NotificationPolicy> {
        match s {
            "windowedThreshold" => Some(NotificationPolicy::WindowedThreshold),
            "perEventFanout" => Some(NotificationPolicy::PerEventFanout),
            _ => None,
        }
    }
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        NotificationPolicy::WindowedThreshold
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Evaluate the active policy for an attendance event that has already been
/// persisted, writing any resulting notification documents. Returns the
/// emitted messages. The caller treats a failure here as partial success:
/// the attendance record stands regardless.
pub fn run(
    store: &dyn Store,
    policy: NotificationPolicy,
    student_id: &str,
    subject_id: &str,
    status: AttendanceStatus,
) -> Result<Vec<String>, CoreError> {
    match policy {
        NotificationPolicy::WindowedThreshold => {
            windowed_threshold(store, student_id, status)
        }
        NotificationPolicy::PerEventFanout => {
            per_event_fanout(store, student_id, subject_id, status)
        }
    }
}

/// Policy A: after an absence, count the student's absences whose `date`
/// falls in the trailing 7-day window anchored at "now" (the just-written
/// record included). At 3 or more, emit exactly one aggregate notification,
/// addressed to no particular tutor.
fn windowed_threshold(
    store: &dyn Store,
    student_id: &str,
    status: AttendanceStatus,
) -> Result<Vec<String>, CoreError> {
    if status != AttendanceStatus::Absent {
        return Ok(Vec::new());
    }

    let cutoff = (Utc::now() - Duration::days(WINDOW_DAYS))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let absences = store.scan(
        model::ATTENDANCE,
        &Filter::new()
            .eq("studentId", student_id)
            .eq("status", "absent")
            .gte("date", cutoff.as_str()),
    )?;
    if (absences.len() as i64) < ABSENCE_THRESHOLD {
        return Ok(Vec::new());
    }

    // No aggregate notification for a student record that no longer
    // resolves; "Unknown" covers only an existing record without name
    // fields.
    let Some(student) = store.get(model::STUDENTS, student_id)? else {
        return Ok(Vec::new());
    };
    let mut student_name = model::student_display_name(&student);
    if student_name.is_empty() {
        student_name = "Unknown".to_string();
    }
    let message = format!(
        "Student {} has {} absences in the last week.",
        student_name, ABSENCE_THRESHOLD
    );

    persist(
        store,
        NotificationRecord {
            student_id: student_id.to_string(),
            tutor_id: String::new(),
            message: message.clone(),
            kind: "absenceThreshold".to_string(),
            sent_at: now_rfc3339(),
            read: false,
        },
    )?;
    Ok(vec![message])
}

/// Policy B: every event fans out one notification per linked tutor. A
/// missing subject degrades to a placeholder in the message; it never stops
/// the fan-out.
fn per_event_fanout(
    store: &dyn Store,
    student_id: &str,
    subject_id: &str,
    status: AttendanceStatus,
) -> Result<Vec<String>, CoreError> {
    let subject_name = match store.get(model::SUBJECTS, subject_id) {
        Ok(Some(doc)) => {
            let name = str_field(&doc, "name");
            if name.is_empty() {
                "class".to_string()
            } else {
                name
            }
        }
        Ok(None) | Err(_) => "class".to_string(),
    };

    let mut messages = Vec::new();
    for tutor in relations::tutors_for_student(store, student_id)? {
        let message = format!("Your child was {} in {}", status.as_str(), subject_name);
        persist(
            store,
            NotificationRecord {
                student_id: student_id.to_string(),
                tutor_id: tutor.id,
                message: message.clone(),
                kind: "attendanceEvent".to_string(),
                sent_at: now_rfc3339(),
                read: false,
            },
        )?;
        messages.push(message);
    }
    Ok(messages)
}

fn persist(store: &dyn Store, record: NotificationRecord) -> Result<(), CoreError> {
    let doc: Value = serde_json::to_value(&record)
        .map_err(|e| CoreError::Upstream(e.to_string()))?;
    store.insert(model::NOTIFICATIONS, &doc)?;
    Ok(())
}
