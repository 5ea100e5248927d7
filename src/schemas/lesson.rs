use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Lesson, LessonQuestion};
use crate::schemas::video::VideoResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    pub(crate) module_id: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: i32,
    #[serde(default)]
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) materials: Option<String>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonUpdate {
    #[serde(default)]
    pub(crate) module_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: Option<i32>,
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) materials: Option<String>,
    #[serde(default)]
    pub(crate) is_deleted: Option<bool>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonListQuery {
    #[serde(default)]
    pub(crate) module_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) url: String,
    pub(crate) materials: Option<String>,
    pub(crate) is_deleted: bool,
    pub(crate) slug: String,
    pub(crate) video_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl LessonResponse {
    pub(crate) fn from_db(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            module_id: lesson.module_id,
            title: lesson.title,
            order: lesson.order,
            url: lesson.url,
            materials: lesson.materials,
            is_deleted: lesson.is_deleted,
            slug: lesson.slug,
            video_count: lesson.video_count,
            created_at: format_primitive(lesson.created_at),
            updated_at: format_primitive(lesson.updated_at),
        }
    }
}

/// Lesson entry nested inside a module.
#[derive(Debug, Serialize)]
pub(crate) struct LessonBrief {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) slug: String,
    pub(crate) video_count: i32,
}

impl LessonBrief {
    pub(crate) fn from_db(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            order: lesson.order,
            slug: lesson.slug,
            video_count: lesson.video_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonDetailResponse {
    #[serde(flatten)]
    pub(crate) lesson: LessonResponse,
    pub(crate) parts: Vec<VideoResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionCreate {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) file: Option<String>,
    #[serde(default)]
    pub(crate) voice_message: Option<String>,
}

impl QuestionCreate {
    /// Blank strings count as absent.
    pub(crate) fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        Self { text: keep(self.text), file: keep(self.file), voice_message: keep(self.voice_message) }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_none() && self.file.is_none() && self.voice_message.is_none()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) user_id: String,
    pub(crate) text: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) voice_message: Option<String>,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: LessonQuestion) -> Self {
        Self {
            id: question.id,
            lesson_id: question.lesson_id,
            user_id: question.user_id,
            text: question.text,
            file: question.file,
            voice_message: question.voice_message,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QuestionCreate;

    #[test]
    fn blank_question_is_empty() {
        let question = QuestionCreate {
            text: Some("   ".to_string()),
            file: None,
            voice_message: Some(String::new()),
        }
        .normalized();
        assert!(question.is_empty());

        let question =
            QuestionCreate { text: Some(" why? ".to_string()), file: None, voice_message: None }
                .normalized();
        assert_eq!(question.text.as_deref(), Some("why?"));
    }
}
