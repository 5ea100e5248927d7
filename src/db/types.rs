use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "usertype", rename_all = "lowercase")]
pub(crate) enum UserType {
    Admin,
    Teacher,
    Student,
    Assistant,
}

impl UserType {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// Progress of a user through a course, module or lesson.
///
/// Statuses only move forward: `blocked -> in_prog -> finished`. Jumping straight
/// from `blocked` to `finished` is allowed; staying put is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "progressstatus", rename_all = "snake_case")]
pub(crate) enum ProgressStatus {
    Blocked,
    InProg,
    Finished,
}

impl ProgressStatus {
    pub(crate) fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::InProg => "in_prog",
            Self::Finished => "finished",
        }
    }
}

impl Default for ProgressStatus {
    fn default() -> Self {
        Self::Blocked
    }
}
