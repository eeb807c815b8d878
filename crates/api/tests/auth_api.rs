//! HTTP-level integration tests for the session lifecycle: signup, login,
//! refresh, logout, and the cookies they set.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, find_cookie, get_auth, is_jwt_shaped, post_auth, post_json, post_with_cookie,
    set_cookie_headers, signup,
};
use parley_db::store::UserStore;
use serde_json::json;

async fn login(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = json!({ "username": username, "password": password });
    let response = post_json(app, "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_signup_then_login_scenario() {
    let test = common::build_test_app();

    let body = json!({
        "username": "alice1",
        "password": "Pass1234",
        "fullName": "Alice A",
        "email": "a@x.com",
    });
    let response = post_json(test.app(), "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["Username"], "alice1");
    assert_eq!(json["data"]["user"]["FullName"], "Alice A");
    assert_eq!(json["data"]["user"]["Email"], "a@x.com");
    assert!(is_jwt_shaped(json["data"]["access_token"].as_str().unwrap()));
    assert!(is_jwt_shaped(json["data"]["refresh_token"].as_str().unwrap()));

    let tokens = login(test.app(), "alice1", "Pass1234").await;
    assert!(is_jwt_shaped(tokens["access_token"].as_str().unwrap()));
    assert!(is_jwt_shaped(tokens["refresh_token"].as_str().unwrap()));

    let body = json!({ "username": "alice1", "password": "Wrong1234" });
    let response = post_json(test.app(), "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_signup_response_never_exposes_hashes() {
    let test = common::build_test_app();
    let data = signup(test.app(), "hidden1").await;

    let rendered = data["user"].to_string().to_lowercase();
    assert!(!rendered.contains("password"), "got {rendered}");
    assert!(!rendered.contains("refresh"), "got {rendered}");
    assert!(!rendered.contains("argon2"), "got {rendered}");
}

#[tokio::test]
async fn test_signup_accepts_pascal_case_keys_and_optional_fields() {
    let test = common::build_test_app();
    let body = json!({
        "Username": "pascal1",
        "Password": "Pass1234",
        "FullName": "Pascal Case",
        "Email": "p@x.com",
        "PhoneNumber": "+15551234567",
        "BirthDate": "1990-04-01",
    });
    let response = post_json(test.app(), "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["PhoneNumber"], "+15551234567");
    assert_eq!(json["data"]["user"]["DateOfBirth"], "1990-04-01");
}

#[tokio::test]
async fn test_signup_sets_http_only_cookies() {
    let test = common::build_test_app();
    let body = json!({
        "username": "cookie1",
        "password": "Pass1234",
        "fullName": "Cookie Monster",
        "email": "c@x.com",
    });
    let response = post_json(test.app(), "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    for name in ["access_token", "refresh_token"] {
        let cookie = find_cookie(&cookies, name);
        assert!(cookie.contains("HttpOnly"), "{cookie}");
        assert!(cookie.contains("Path=/"), "{cookie}");
        assert!(cookie.contains("Max-Age=604800"), "{cookie}");
    }
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let test = common::build_test_app();
    signup(test.app(), "taken1").await;

    let body = json!({
        "username": "taken1",
        "password": "Pass1234",
        "fullName": "Second",
        "email": "second@x.com",
    });
    let response = post_json(test.app(), "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "username already exists");
}

#[tokio::test]
async fn test_signup_validation_errors_are_400() {
    let test = common::build_test_app();
    let cases = [
        json!({ "username": "a", "password": "Pass1234", "fullName": "A", "email": "a@x.com" }),
        json!({ "username": "bob123", "password": "short", "fullName": "B", "email": "b@x.com" }),
        json!({ "username": "bob123", "password": "Pass1234", "fullName": "B", "email": "nope" }),
        json!({ "username": "bob123", "password": "Pass1234", "fullName": "B", "email": "b@x.com",
                "birthDate": "2000/01/01" }),
        json!({ "username": "bob123", "password": "Pass1234" }),
    ];

    for body in cases {
        let response = post_json(test.app(), "/api/auth/signup", body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    assert!(test.store.find_by_username("bob123").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_unknown_user_is_401() {
    let test = common::build_test_app();
    let body = json!({ "username": "ghost", "password": "Pass1234" });
    let response = post_json(test.app(), "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sequential_logins_issue_distinct_refresh_tokens() {
    let test = common::build_test_app();
    signup(test.app(), "twice1").await;

    let first = login(test.app(), "twice1", "Pass1234").await;
    let second = login(test.app(), "twice1", "Pass1234").await;
    assert_ne!(first["refresh_token"], second["refresh_token"]);

    let stale = json!({ "refresh_token": first["refresh_token"] });
    let response = post_json(test.app(), "/api/auth/refresh", stale).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let fresh = json!({ "refresh_token": second["refresh_token"] });
    let response = post_json(test.app(), "/api/auth/refresh", fresh).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_via_body_mints_new_access_token() {
    let test = common::build_test_app();
    signup(test.app(), "refresh1").await;
    let tokens = login(test.app(), "refresh1", "Pass1234").await;

    let body = json!({ "refresh_token": tokens["refresh_token"] });
    let response = post_json(test.app(), "/api/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let refreshed = body_json(response).await["data"].clone();
    assert_eq!(refreshed["refresh_token"], tokens["refresh_token"]);
    assert_ne!(refreshed["access_token"], tokens["access_token"]);

    let access = refreshed["access_token"].as_str().unwrap();
    let response = get_auth(test.app(), "/api/users/me", access).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_prefers_cookie_and_resets_access_cookie() {
    let test = common::build_test_app();
    let data = signup(test.app(), "refresh2").await;
    let refresh_token = data["refresh_token"].as_str().unwrap();

    let response = post_with_cookie(
        test.app(),
        "/api/auth/refresh",
        &format!("refresh_token={refresh_token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    let access_cookie = find_cookie(&cookies, "access_token");
    assert!(access_cookie.contains("HttpOnly"));
    assert!(
        !cookies.iter().any(|c| c.starts_with("refresh_token=")),
        "refresh cookie must not be reissued: {cookies:?}"
    );
}

#[tokio::test]
async fn test_refresh_without_token_is_401() {
    let test = common::build_test_app();
    let response = post_json(test.app(), "/api/auth/refresh", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_access_token_is_401() {
    let test = common::build_test_app();
    let data = signup(test.app(), "refresh3").await;

    let body = json!({ "refresh_token": data["access_token"] });
    let response = post_json(test.app(), "/api/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_logout_revokes_access_and_refresh_tokens() {
    let test = common::build_test_app();
    signup(test.app(), "leaver1").await;
    let tokens = login(test.app(), "leaver1", "Pass1234").await;
    let access = tokens["access_token"].as_str().unwrap();

    let response = post_auth(test.app(), "/api/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookie_headers(&response);
    assert!(find_cookie(&cookies, "access_token").contains("Max-Age=0"));
    assert!(find_cookie(&cookies, "refresh_token").contains("Max-Age=0"));
    assert_eq!(body_json(response).await["data"], true);

    // The just-used access token is now rejected by the guard.
    let response = get_auth(test.app(), "/api/users/me", access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");

    // The stored refresh hash is gone.
    let body = json!({ "refresh_token": tokens["refresh_token"] });
    let response = post_json(test.app(), "/api/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = test.store.find_by_username("leaver1").await.unwrap().unwrap();
    assert!(user.refresh_token_hash.is_none());
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let test = common::build_test_app();
    let response = post_json(test.app(), "/api/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_after_logout_issues_working_tokens() {
    let test = common::build_test_app();
    let data = signup(test.app(), "again1").await;
    let old_access = data["access_token"].as_str().unwrap();
    post_auth(test.app(), "/api/auth/logout", old_access).await;

    let tokens = login(test.app(), "again1", "Pass1234").await;
    let new_access = tokens["access_token"].as_str().unwrap();
    let response = get_auth(test.app(), "/api/users/me", new_access).await;
    assert_eq!(response.status(), StatusCode::OK);
}
