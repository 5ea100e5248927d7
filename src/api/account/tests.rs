use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{ProgressStatus, UserType};
use crate::repositories;
use crate::repositories::progress::ProgressKind;
use crate::test_support;

fn registration(phone: &str, confirm: &str) -> serde_json::Value {
    json!({
        "phone_number": phone,
        "password": "secret-pass",
        "confirm_password": confirm,
        "first_name": "Ali",
        "last_name": "Valiyev"
    })
}

#[tokio::test]
async fn register_creates_student_once() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/user/register",
            None,
            Some(registration("901234567", "secret-pass")),
        ))
        .await
        .expect("register");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["user_type"], "student");
    assert_eq!(body["phone_number"], "901234567");
    assert!(body.get("hashed_password").is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/user/register",
            None,
            Some(registration("901234567", "secret-pass")),
        ))
        .await
        .expect("register again");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let ctx = test_support::setup_test_context().await;

    for payload in [registration("901234567", "other-pass"), registration("12345", "secret-pass")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/user/register",
                None,
                Some(payload),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert!(!repositories::users::exists_by_phone(ctx.state.db(), "901234567").await.unwrap());
}

#[tokio::test]
async fn delete_account_leaves_one_tombstone() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, "/api/v1/user/delete", Some(&token), None))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let found = repositories::users::find_by_id(ctx.state.db(), &user.id).await.expect("find");
    assert!(found.is_none());
    let tombstones = repositories::deleted_users::count_by_phone(ctx.state.db(), "901234567")
        .await
        .expect("tombstones");
    assert_eq!(tombstones, 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, "/api/v1/user/delete", Some(&token), None))
        .await
        .expect("delete again");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_me_returns_profile_without_storage() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/user/get-me", Some(&token), None))
        .await
        .expect("get-me");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["first_name"], "Test");
    assert_eq!(body["photo"], "users/default.jpg");
    assert!(body["photo_url"].is_null());
}

#[tokio::test]
async fn password_change_requires_matching_confirmation() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/user/profile/password",
            Some(&token),
            Some(json!({"password": "brand-new-pass", "confirm_password": "different-pass"})),
        ))
        .await
        .expect("password");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            "/api/v1/user/profile/password",
            Some(&token),
            Some(json!({"password": "brand-new-pass", "confirm_password": "brand-new-pass"})),
        ))
        .await
        .expect("password");
    assert_eq!(response.status(), StatusCode::OK);

    let stored = repositories::users::find_by_id(ctx.state.db(), &user.id)
        .await
        .expect("find")
        .expect("user");
    assert!(crate::core::security::verify_password("brand-new-pass", &stored.hashed_password)
        .unwrap());
}

#[tokio::test]
async fn lesson_tasks_require_unlocked_lesson() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let user = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let course = test_support::insert_course(db, "Backend").await;
    let module = test_support::insert_module(db, &course.id, "Rust").await;
    let lesson = test_support::insert_lesson(db, &module.id, "Ownership").await;
    let optional = test_support::insert_task(db, &lesson.id, "Practice", false).await;
    test_support::insert_task(db, &lesson.id, "Exam", true).await;

    let uri = format!("/api/v1/user/task/{}", lesson.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("tasks");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    test_support::enroll(db, ProgressKind::Lessons, &user.id, &lesson.id, ProgressStatus::InProg)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("tasks");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let tasks = body.as_array().expect("tasks array");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], optional.id);
}

#[tokio::test]
async fn my_courses_lists_only_enrolled_courses() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let user = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let enrolled = test_support::insert_course(db, "Backend").await;
    test_support::insert_course(db, "Frontend").await;
    test_support::enroll(db, ProgressKind::Courses, &user.id, &enrolled.id, ProgressStatus::InProg)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/user/my-courses", Some(&token), None))
        .await
        .expect("my courses");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body, json!([{"id": enrolled.id, "title": "Backend", "modul_count": 0}]));
}

#[tokio::test]
async fn teachers_are_public() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Teacher).await;
    test_support::insert_user(ctx.state.db(), "907654321", "secret-pass", UserType::Student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/teachers", None, None))
        .await
        .expect("teachers");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}
