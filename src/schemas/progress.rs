use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::time::{date_after_days, format_primitive};
use crate::db::models::{ProgressRecord, UserTask};
use crate::db::types::ProgressStatus;
use crate::repositories::progress::ProgressKind;
use crate::schemas::dates::format_date;

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressCreate {
    pub(crate) user_id: String,
    #[serde(
        alias = "course",
        alias = "module",
        alias = "lesson",
        alias = "course_id",
        alias = "module_id",
        alias = "lesson_id"
    )]
    pub(crate) entity_id: String,
    #[serde(default)]
    pub(crate) status: ProgressStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressUpdate {
    pub(crate) status: ProgressStatus,
}

/// Serializes a progress row under the key of its entity (`course`, `module`, `lesson`).
/// Course rows also carry the mentor support deadline.
pub(crate) fn progress_json(kind: ProgressKind, record: ProgressRecord, support_days: i64) -> Value {
    let mut body = json!({
        "id": record.id,
        "user": record.user_id,
        "status": record.status,
        "created_at": format_primitive(record.created_at),
        "updated_at": format_primitive(record.updated_at),
    });

    let key = match kind {
        ProgressKind::Courses => "course",
        ProgressKind::Modules => "module",
        ProgressKind::Lessons => "lesson",
    };
    body[key] = json!(record.entity_id);

    if kind == ProgressKind::Courses {
        body["support_day"] = json!(format_date(date_after_days(record.created_at, support_days)));
    }

    body
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserTaskCreate {
    pub(crate) user_id: String,
    #[serde(alias = "task")]
    pub(crate) task_id: String,
    #[serde(default)]
    pub(crate) finished: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserTaskUpdate {
    pub(crate) finished: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserTaskResponse {
    pub(crate) id: String,
    pub(crate) user: String,
    pub(crate) task: String,
    pub(crate) finished: bool,
    pub(crate) updated_at: String,
}

impl UserTaskResponse {
    pub(crate) fn from_db(row: UserTask) -> Self {
        Self {
            id: row.id,
            user: row.user_id,
            task: row.task_id,
            finished: row.finished,
            updated_at: format_primitive(row.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, PrimitiveDateTime, Time};

    fn record() -> ProgressRecord {
        let created = PrimitiveDateTime::new(
            Date::from_calendar_date(2025, Month::January, 1).unwrap(),
            Time::from_hms(9, 0, 0).unwrap(),
        );
        ProgressRecord {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            entity_id: "c1".to_string(),
            status: ProgressStatus::InProg,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn course_progress_uses_course_key_and_support_day() {
        let body = progress_json(ProgressKind::Courses, record(), 45);
        assert_eq!(body["course"], "c1");
        assert_eq!(body["status"], "in_prog");
        assert_eq!(body["support_day"], "2025-02-15");
        assert!(body.get("module").is_none());
    }

    #[test]
    fn lesson_progress_has_no_support_day() {
        let body = progress_json(ProgressKind::Lessons, record(), 45);
        assert_eq!(body["lesson"], "c1");
        assert!(body.get("support_day").is_none());
    }

    #[test]
    fn create_accepts_entity_specific_keys() {
        let payload: ProgressCreate =
            serde_json::from_value(json!({"user_id": "u", "module": "m"})).unwrap();
        assert_eq!(payload.entity_id, "m");
        assert_eq!(payload.status, ProgressStatus::Blocked);
    }
}
