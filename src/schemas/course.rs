use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Course;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: i32,
    #[serde(default)]
    pub(crate) url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    pub(crate) url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) url: String,
    pub(crate) lesson_count: i32,
    pub(crate) modul_count: i32,
    pub(crate) task_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            order: course.order,
            url: course.url,
            lesson_count: course.lesson_count,
            modul_count: course.modul_count,
            task_count: course.task_count,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

/// Catalog card used by the public list and "my courses".
#[derive(Debug, Serialize)]
pub(crate) struct CourseSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) modul_count: i32,
}

impl CourseSummary {
    pub(crate) fn from_db(course: Course) -> Self {
        Self { id: course.id, title: course.title, modul_count: course.modul_count }
    }
}
