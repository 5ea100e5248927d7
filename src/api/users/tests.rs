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

#[tokio::test]
async fn get_me_returns_phone_for_any_user() {
    let ctx = test_support::setup_test_context().await;
    let student =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, body) = send(&ctx, Method::GET, "/api/v1/users/get-me", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "901234567"}));
}

#[tokio::test]
async fn user_list_is_admin_only() {
    let ctx = test_support::setup_test_context().await;
    let student =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, body) = send(&ctx, Method::GET, "/api/v1/users", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Admin access required");
}

#[tokio::test]
async fn admin_filters_users_by_type_and_search() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    test_support::insert_user(db, "907654321", "secret-pass", UserType::Student).await;
    test_support::insert_user(db, "905555555", "secret-pass", UserType::Teacher).await;

    let (status, body) =
        send(&ctx, Method::GET, "/api/v1/users?type=student&limit=1", &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["limit"], 1);

    let (status, body) = send(&ctx, Method::GET, "/api/v1/users?search=90555", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["user_type"], "teacher");
}

#[tokio::test]
async fn admin_creates_updates_and_deletes_user() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let (status, created) = send(
        &ctx,
        Method::POST,
        "/api/v1/users",
        &token,
        Some(json!({
            "phone_number": "901234567",
            "password": "secret-pass",
            "first_name": "Ali",
            "user_type": "assistant"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["user_type"], "assistant");
    let user_id = created["id"].as_str().expect("id").to_string();

    let (status, updated) = send(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/users/{user_id}"),
        &token,
        Some(json!({"user_type": "teacher", "is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["user_type"], "teacher");
    assert_eq!(updated["is_active"], false);

    let (status, _) =
        send(&ctx, Method::DELETE, &format!("/api/v1/users/{user_id}"), &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        repositories::deleted_users::count_by_phone(db, "901234567").await.expect("count"),
        1
    );

    let (status, body) = send(&ctx, Method::GET, "/api/v1/admin/deleted-users", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["phone_number"], "901234567");

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/v1/users/{user_id}"), &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
