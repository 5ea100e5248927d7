use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Module;
use crate::db::types::ProgressStatus;
use crate::schemas::dates::{deserialize_option_date, format_date};
use crate::schemas::lesson::LessonBrief;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) learning_type: String,
    #[serde(default)]
    pub(crate) has_in_tg: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: i32,
    #[serde(default)]
    pub(crate) row_num: i32,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) support_day: Option<Date>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleUpdate {
    #[serde(default)]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) learning_type: Option<String>,
    #[serde(default)]
    pub(crate) has_in_tg: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    pub(crate) row_num: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) support_day: Option<Date>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) learning_type: String,
    pub(crate) has_in_tg: String,
    pub(crate) order: i32,
    pub(crate) row_num: i32,
    pub(crate) support_day: String,
    pub(crate) slug: String,
    pub(crate) lesson_count: i32,
    pub(crate) task_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) lessons: Vec<LessonBrief>,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: Module, lessons: Vec<LessonBrief>) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            learning_type: module.learning_type,
            has_in_tg: module.has_in_tg,
            order: module.order,
            row_num: module.row_num,
            support_day: format_date(module.support_day),
            slug: module.slug,
            lesson_count: module.lesson_count,
            task_count: module.task_count,
            created_at: format_primitive(module.created_at),
            updated_at: format_primitive(module.updated_at),
            lessons,
        }
    }
}

/// A module as an enrolled student sees it: their own status plus visible lessons.
#[derive(Debug, Serialize)]
pub(crate) struct CourseModuleResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) learning_type: String,
    pub(crate) has_in_tg: String,
    pub(crate) order: i32,
    pub(crate) support_day: String,
    pub(crate) slug: String,
    pub(crate) lesson_count: i32,
    pub(crate) task_count: i32,
    pub(crate) status: ProgressStatus,
    pub(crate) lessons: Vec<LessonBrief>,
}

impl CourseModuleResponse {
    pub(crate) fn from_db(module: Module, status: ProgressStatus, lessons: Vec<LessonBrief>) -> Self {
        Self {
            id: module.id,
            title: module.title,
            learning_type: module.learning_type,
            has_in_tg: module.has_in_tg,
            order: module.order,
            support_day: format_date(module.support_day),
            slug: module.slug,
            lesson_count: module.lesson_count,
            task_count: module.task_count,
            status,
            lessons,
        }
    }
}
