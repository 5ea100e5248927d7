use std::path::Path;

use async_trait::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::errors::ApiError;

pub(crate) const PHONE_LEN: usize = 9;

const MATERIAL_EXTENSIONS: &[&str] = &["pdf", "pptx", "ppt"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// JSON body that is deserialized and then checked with `validator`.
/// Malformed bodies and missing fields answer 400.
pub(crate) struct ValidatedJson<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        value.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Plain JSON body with rejections mapped to 400 instead of axum's 415/422.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

pub(crate) fn validate_phone(phone_number: &str) -> Result<(), ApiError> {
    let valid =
        phone_number.len() == PHONE_LEN && phone_number.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Phone number must be exactly 9 digits, for example 901234567".to_string(),
        ))
    }
}

pub(crate) fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
) -> Result<(), ApiError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Passwords do not match".to_string()))
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn validate_extension(filename: &str, allowed: &[&str], what: &str) -> Result<(), ApiError> {
    let extension = extension_of(filename)
        .ok_or_else(|| ApiError::BadRequest(format!("{what} file must have an extension")))?;

    if allowed.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "{what} extension '{extension}' is not allowed; use one of: {}",
            allowed.join(", ")
        )))
    }
}

pub(crate) fn validate_material_file(filename: &str) -> Result<(), ApiError> {
    validate_extension(filename, MATERIAL_EXTENSIONS, "Material")
}

/// Empty means the video is hosted elsewhere (YouTube, media_url).
pub(crate) fn validate_video_file(filename: &str) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Ok(());
    }
    validate_extension(filename, VIDEO_EXTENSIONS, "Video")
}

pub(crate) fn validate_image_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = extension_of(filename)
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_nine_digits() {
        assert!(validate_phone("901234567").is_ok());
        assert!(validate_phone("90123456").is_err());
        assert!(validate_phone("+99890123").is_err());
        assert!(validate_phone("9012345678").is_err());
    }

    #[test]
    fn material_and_video_extensions() {
        assert!(validate_material_file("slides.PPTX").is_ok());
        assert!(validate_material_file("notes.docx").is_err());
        assert!(validate_video_file("").is_ok());
        assert!(validate_video_file("lesson.mkv").is_ok());
        assert!(validate_video_file("lesson.mov").is_err());
    }

    #[test]
    fn image_mime_must_match_extension() {
        let allowed = vec!["jpg".to_string(), "png".to_string()];
        assert!(validate_image_upload("me.jpg", "image/jpeg", &allowed).is_ok());
        assert!(validate_image_upload("me.png", "image/jpeg", &allowed).is_err());
        assert!(validate_image_upload("me.webp", "image/webp", &allowed).is_err());
    }
}
