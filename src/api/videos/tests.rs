use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserType;
use crate::repositories;
use crate::test_support::{self, TestContext};

async fn send(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, serde_json::Value::Null);
    }
    (status, test_support::read_json(response).await)
}

async fn video_count(ctx: &TestContext, lesson_id: &str) -> i32 {
    repositories::lessons::find_by_id(ctx.state.db(), lesson_id)
        .await
        .expect("find")
        .expect("lesson")
        .video_count
}

#[tokio::test]
async fn video_crud_keeps_lesson_video_count() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let course = test_support::insert_course(db, "Backend").await;
    let module = test_support::insert_module(db, &course.id, "Intro").await;
    let first = test_support::insert_lesson(db, &module.id, "First").await;
    let second = test_support::insert_lesson(db, &module.id, "Second").await;

    let (status, created) = send(
        &ctx,
        Method::POST,
        "/api/v1/video",
        &token,
        Some(json!({
            "lesson_id": first.id,
            "title": "Part 1",
            "media_code": "abc123",
            "is_youtube": true,
            "media_url": "https://youtu.be/abc123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let video_id = created["id"].as_str().expect("video id").to_string();
    assert_eq!(video_count(&ctx, &first.id).await, 1);

    let uri = format!("/api/v1/video/{video_id}");
    let (status, body) = send(&ctx, Method::GET, &uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Part 1");

    let (status, body) = send(
        &ctx,
        Method::PATCH,
        &uri,
        &token,
        Some(json!({"lesson_id": second.id, "title": "Part 1 (moved)"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["lesson_id"], second.id);
    assert_eq!(video_count(&ctx, &first.id).await, 0);
    assert_eq!(video_count(&ctx, &second.id).await, 1);

    let list_uri = format!("/api/v1/video?lesson_id={}", second.id);
    let (status, body) = send(&ctx, Method::GET, &list_uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&ctx, Method::DELETE, &uri, &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(video_count(&ctx, &second.id).await, 0);

    let (status, _) = send(&ctx, Method::DELETE, &uri, &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_file_extension_is_checked() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let course = test_support::insert_course(db, "Backend").await;
    let module = test_support::insert_module(db, &course.id, "Intro").await;
    let lesson = test_support::insert_lesson(db, &module.id, "First").await;

    let (status, _) = send(
        &ctx,
        Method::POST,
        "/api/v1/video",
        &token,
        Some(json!({"lesson_id": lesson.id, "title": "Part 1", "file": "videos/part1.exe"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(video_count(&ctx, &lesson.id).await, 0);
}

#[tokio::test]
async fn students_cannot_manage_videos() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, _) = send(&ctx, Method::GET, "/api/v1/video", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
