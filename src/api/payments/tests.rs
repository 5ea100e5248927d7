use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserType;
use crate::repositories;
use crate::test_support::{self, TestContext};

async fn post_payment(
    ctx: &TestContext,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/payments", Some(token), Some(body)))
        .await
        .expect("payment");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn income_then_expense_updates_balance() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;

    let (status, body) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "reason": "Top up", "amount": 500000, "income": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["balance"], 500000);

    let (status, body) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "expend": "Backend course", "amount": 200000, "income": false}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["balance"], 300000);

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/user/payments",
            Some(&student_token),
            None,
        ))
        .await
        .expect("own payments");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn expense_beyond_balance_is_rejected_without_writes() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;

    let (status, body) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "expend": "Course", "amount": 1, "income": false}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Insufficient balance");

    let stored = repositories::users::find_by_id(db, &student.id)
        .await
        .expect("find")
        .expect("user");
    assert_eq!(stored.balance, 0);
    assert_eq!(repositories::payments::count(db, Some(&student.id)).await.expect("count"), 0);
}

#[tokio::test]
async fn income_overflowing_balance_is_rejected_without_writes() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;

    let (status, body) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "reason": "Top up", "amount": 1, "income": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");

    let (status, body) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "reason": "Huge", "amount": i64::MAX, "income": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "Amount exceeds the maximum balance");

    let stored = repositories::users::find_by_id(db, &student.id)
        .await
        .expect("find")
        .expect("user");
    assert_eq!(stored.balance, 1);
    assert_eq!(repositories::payments::count(db, Some(&student.id)).await.expect("count"), 1);
}

#[tokio::test]
async fn negative_amount_and_unknown_user_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin = test_support::insert_user(db, "900000001", "admin-pass", UserType::Admin).await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let (status, _) =
        post_payment(&ctx, &token, json!({"user_id": admin.id, "amount": -5, "income": true})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        post_payment(&ctx, &token, json!({"user_id": "missing", "amount": 5, "income": true})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_cannot_record_payments() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let student = test_support::insert_user(db, "901234567", "secret-pass", UserType::Student).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, _) = post_payment(
        &ctx,
        &token,
        json!({"user_id": student.id, "amount": 1000, "income": true}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
