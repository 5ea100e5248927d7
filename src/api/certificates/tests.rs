use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{ProgressStatus, UserType};
use crate::repositories::progress::ProgressKind;
use crate::test_support;

#[tokio::test]
async fn certificate_requires_finished_course() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let course = test_support::insert_course(db, "Backend").await;

    let body = json!({"user_id": student.id, "course_id": course.id});

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates",
            Some(&token),
            Some(body.clone()),
        ))
        .await
        .expect("issue unenrolled");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    test_support::enroll(db, ProgressKind::Courses, &student.id, &course.id, ProgressStatus::InProg)
        .await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates",
            Some(&token),
            Some(body.clone()),
        ))
        .await
        .expect("issue in progress");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = test_support::read_json(response).await;
    assert_eq!(payload["detail"], "Course is not finished yet");

    sqlx::query("UPDATE user_courses SET status = 'finished' WHERE user_id = $1")
        .bind(&student.id)
        .execute(db)
        .await
        .expect("finish course");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates",
            Some(&token),
            Some(body),
        ))
        .await
        .expect("issue finished");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = test_support::read_json(response).await;
    let id = payload["id"].as_str().expect("id");
    assert_eq!(payload["qr_code"], format!("certificates/{id}.png"));

    let uri = format!("/api/v1/certificates?user_id={}", student.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = test_support::read_json(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn students_cannot_issue_certificates() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let course = test_support::insert_course(db, "Backend").await;
    test_support::enroll(db, ProgressKind::Courses, &student.id, &course.id, ProgressStatus::Finished)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/certificates",
            Some(&token),
            Some(json!({"user_id": student.id, "course_id": course.id})),
        ))
        .await
        .expect("issue");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
