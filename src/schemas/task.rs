use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Task, TaskChat};
use crate::schemas::dates::deserialize_option_datetime;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TaskCreate {
    pub(crate) lesson_id: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) user_task_list: String,
    #[serde(default)]
    pub(crate) task_number: i32,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) last_time: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: i32,
    #[serde(default)]
    pub(crate) priority: i32,
    #[serde(default)]
    pub(crate) must_complete: bool,
    #[serde(default)]
    pub(crate) files: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TaskUpdate {
    #[serde(default)]
    pub(crate) lesson_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) user_task_list: Option<String>,
    #[serde(default)]
    pub(crate) task_number: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) last_time: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    pub(crate) priority: Option<i32>,
    #[serde(default)]
    pub(crate) must_complete: Option<bool>,
    #[serde(default)]
    pub(crate) files: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskListQuery {
    #[serde(default)]
    pub(crate) lesson_id: Option<String>,
    #[serde(default)]
    pub(crate) must_complete: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskResponse {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) status: String,
    pub(crate) user_task_list: String,
    pub(crate) task_number: i32,
    pub(crate) last_time: String,
    pub(crate) order: i32,
    pub(crate) priority: i32,
    pub(crate) must_complete: bool,
    pub(crate) files: Option<String>,
    pub(crate) created_at: String,
}

impl TaskResponse {
    pub(crate) fn from_db(task: Task) -> Self {
        Self {
            id: task.id,
            lesson_id: task.lesson_id,
            title: task.title,
            description: task.description,
            status: task.status,
            user_task_list: task.user_task_list,
            task_number: task.task_number,
            last_time: format_primitive(task.last_time),
            order: task.order,
            priority: task.priority,
            must_complete: task.must_complete,
            files: task.files,
            created_at: format_primitive(task.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChatMessageCreate {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) file: Option<String>,
    #[serde(default)]
    pub(crate) voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessageResponse {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) user_id: String,
    pub(crate) text: String,
    pub(crate) file: Option<String>,
    pub(crate) voice: Option<String>,
    pub(crate) created_at: String,
}

impl ChatMessageResponse {
    pub(crate) fn from_db(message: TaskChat) -> Self {
        Self {
            id: message.id,
            task_id: message.task_id,
            user_id: message.user_id,
            text: message.text,
            file: message.file,
            voice: message.voice,
            created_at: format_primitive(message.created_at),
        }
    }
}
