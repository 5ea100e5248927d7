use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Video;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VideoCreate {
    pub(crate) lesson_id: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) media_code: String,
    #[serde(default)]
    pub(crate) file: String,
    #[serde(default)]
    pub(crate) is_youtube: bool,
    #[serde(default)]
    pub(crate) media_url: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VideoUpdate {
    #[serde(default)]
    pub(crate) lesson_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) media_code: Option<String>,
    #[serde(default)]
    pub(crate) file: Option<String>,
    #[serde(default)]
    pub(crate) is_youtube: Option<bool>,
    #[serde(default)]
    pub(crate) media_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListQuery {
    #[serde(default)]
    pub(crate) lesson_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoResponse {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) media_code: String,
    pub(crate) file: String,
    pub(crate) is_youtube: bool,
    pub(crate) media_url: String,
    pub(crate) order: i32,
    pub(crate) created_at: String,
}

impl VideoResponse {
    pub(crate) fn from_db(video: Video) -> Self {
        Self {
            id: video.id,
            lesson_id: video.lesson_id,
            title: video.title,
            description: video.description,
            media_code: video.media_code,
            file: video.file,
            is_youtube: video.is_youtube,
            media_url: video.media_url,
            order: video.order,
            created_at: format_primitive(video.created_at),
        }
    }
}
