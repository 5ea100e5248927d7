use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{ProgressStatus, UserType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) phone_number: String,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) hashed_password: String,
    pub(crate) user_type: UserType,
    pub(crate) tg_id: Option<i64>,
    pub(crate) balance: i64,
    pub(crate) bot_options: Option<String>,
    pub(crate) has_registered_bot: bool,
    pub(crate) not_read_message_count: i32,
    pub(crate) payme_balance: i64,
    pub(crate) photo: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) url: String,
    pub(crate) lesson_count: i32,
    pub(crate) modul_count: i32,
    pub(crate) task_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Module {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) learning_type: String,
    pub(crate) has_in_tg: String,
    pub(crate) order: i32,
    pub(crate) row_num: i32,
    pub(crate) support_day: Date,
    pub(crate) slug: String,
    pub(crate) lesson_count: i32,
    pub(crate) task_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) url: String,
    pub(crate) materials: Option<String>,
    pub(crate) is_deleted: bool,
    pub(crate) slug: String,
    pub(crate) video_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Video {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) media_code: String,
    pub(crate) file: String,
    pub(crate) is_youtube: bool,
    pub(crate) media_url: String,
    pub(crate) order: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Task {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) status: String,
    pub(crate) user_task_list: String,
    pub(crate) task_number: i32,
    pub(crate) last_time: PrimitiveDateTime,
    pub(crate) order: i32,
    pub(crate) priority: i32,
    pub(crate) must_complete: bool,
    pub(crate) files: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LessonQuestion {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) user_id: String,
    pub(crate) text: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) voice_message: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TaskChat {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) user_id: String,
    pub(crate) text: String,
    pub(crate) file: Option<String>,
    pub(crate) voice: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One row of `user_courses`, `user_modules` or `user_lessons`.
/// `entity_id` is the course, module or lesson id depending on the table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ProgressRecord {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) entity_id: String,
    pub(crate) status: ProgressStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserTask {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) task_id: String,
    pub(crate) finished: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Payment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) reason: String,
    pub(crate) expend: String,
    pub(crate) amount: i64,
    pub(crate) income: bool,
    pub(crate) processed_date: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Device {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Certificate {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) finished_at: Date,
    pub(crate) qr_code: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct DeletedUser {
    pub(crate) id: String,
    pub(crate) phone_number: String,
    pub(crate) username: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
