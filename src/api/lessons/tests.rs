use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Lesson, User};
use crate::db::types::{ProgressStatus, UserType};
use crate::repositories;
use crate::repositories::progress::ProgressKind;
use crate::test_support::{self, TestContext};

struct Fixture {
    student: User,
    token: String,
    course_id: String,
    lesson: Lesson,
}

async fn fixture(ctx: &TestContext) -> Fixture {
    let db = ctx.state.db();
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let course = test_support::insert_course(db, "Backend").await;
    let module = test_support::insert_module(db, &course.id, "Intro").await;
    let lesson = test_support::insert_lesson(db, &module.id, "Hello").await;

    repositories::videos::create(
        db,
        repositories::videos::CreateVideo {
            id: &Uuid::new_v4().to_string(),
            lesson_id: &lesson.id,
            title: "Part 1",
            description: "",
            media_code: "abc123",
            file: "",
            is_youtube: true,
            media_url: "https://youtu.be/abc123",
            order: 1,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert video");

    Fixture { student, token, course_id: course.id, lesson }
}

async fn get(ctx: &TestContext, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn lesson_detail_requires_course_enrollment() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;
    let uri = format!("/api/v1/lesson/{}", fx.lesson.id);

    let (status, _) = get(&ctx, &uri, &fx.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    test_support::enroll(
        ctx.state.db(),
        ProgressKind::Courses,
        &fx.student.id,
        &fx.course_id,
        ProgressStatus::InProg,
    )
    .await;

    let (status, body) = get(&ctx, &uri, &fx.token).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["id"], fx.lesson.id);
    assert_eq!(body["parts"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["parts"][0]["media_code"], "abc123");
    assert_eq!(body["video_count"], 1);
}

#[tokio::test]
async fn unknown_lesson_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;

    let (status, body) = get(&ctx, "/api/v1/lesson/missing", &fx.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Lesson not found");
}

#[tokio::test]
async fn hidden_lesson_is_not_found_even_when_enrolled() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;
    test_support::enroll(
        ctx.state.db(),
        ProgressKind::Courses,
        &fx.student.id,
        &fx.course_id,
        ProgressStatus::InProg,
    )
    .await;
    sqlx::query("UPDATE lessons SET is_deleted = TRUE WHERE id = $1")
        .bind(&fx.lesson.id)
        .execute(ctx.state.db())
        .await
        .expect("hide lesson");

    let (status, _) = get(&ctx, &format!("/api/v1/lesson/{}", fx.lesson.id), &fx.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_only_see_their_own_questions() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;
    let db = ctx.state.db();
    let other = test_support::insert_user(db, "907654321", "secret-pass", UserType::Student).await;
    let other_token = test_support::bearer_token(&other.id, ctx.state.settings());
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    for user in [&fx.student, &other] {
        test_support::enroll(db, ProgressKind::Courses, &user.id, &fx.course_id, ProgressStatus::InProg)
            .await;
    }

    let uri = format!("/api/v1/lesson/{}/questions", fx.lesson.id);
    for (token, text) in [(&fx.token, "mine"), (&other_token, "theirs")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(token),
                Some(json!({"text": text})),
            ))
            .await
            .expect("ask");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&fx.token),
            Some(json!({"text": "   "})),
        ))
        .await
        .expect("blank question");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = get(&ctx, &uri, &fx.token).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body.as_array().expect("questions");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["text"], "mine");

    let (status, body) = get(&ctx, &uri, &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}
