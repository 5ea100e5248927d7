use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserType;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn token_pair_is_issued_for_valid_credentials() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/token",
            None,
            Some(json!({"phone_number": "901234567", "password": "secret-pass"})),
        ))
        .await
        .expect("token");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["user"]["user_id"], user.id);
    assert_eq!(body["user"]["phone"], "901234567");
    assert!(body["access"].as_str().is_some_and(|token| !token.is_empty()));

    let refresh = body["refresh"].as_str().expect("refresh").to_string();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/token/refresh",
            None,
            Some(json!({"refresh": refresh})),
        ))
        .await
        .expect("refresh");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert!(body["access"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_phone_are_both_unauthorized() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student).await;

    for (phone, password) in [("901234567", "wrong-pass"), ("909999999", "secret-pass")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/token",
                None,
                Some(json!({"phone_number": phone, "password": password})),
            ))
            .await
            .expect("token");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = test_support::read_json(response).await;
        assert_eq!(body["detail"], "No active account found with the given credentials");
    }
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;
    let access = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/token/refresh",
            None,
            Some(json!({"refresh": access})),
        ))
        .await
        .expect("refresh");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_reports_garbage_token() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/token/verify",
            None,
            Some(json!({"token": "not-a-jwt"})),
        ))
        .await
        .expect("verify");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_device_token() {
    let ctx = test_support::setup_test_context().await;
    let user =
        test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student)
            .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::USER_AGENT,
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
        )
        .body(Body::from(
            json!({"phone_number": "901234567", "password": "secret-pass"}).to_string(),
        ))
        .expect("request");
    let response = ctx.app.clone().oneshot(request).await.expect("device login");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let token = body["token"].as_str().expect("token").to_string();

    let devices = repositories::devices::list_for_user(ctx.state.db(), &user.id)
        .await
        .expect("devices");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].title, "Chrome on Windows");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/user/device", Some(&token), None))
        .await
        .expect("devices");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/auth/logout", Some(&token), None))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/user/get-me", Some(&token), None))
        .await
        .expect("get-me");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn check_phone_reports_registration() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "901234567", "secret-pass", UserType::Student).await;

    for (phone, expected) in [("901234567", true), ("901111111", false)] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/check/phone",
                None,
                Some(json!({"phone_number": phone})),
            ))
            .await
            .expect("check phone");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(test_support::read_json(response).await, json!(expected));
    }
}
