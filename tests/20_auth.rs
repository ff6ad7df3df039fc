mod common;

use academy_api::auth::{TokenKind, ACCESS_COOKIE, REFRESH_COOKIE};
use academy_api::types::Role;
use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let app = TestApp::offline()?;
    for uri in ["/api/v1/auth/me", "/api/v1/students", "/api/v1/dashboard", "/api/v1/notification"] {
        let res = app.request(Method::GET, uri, None, None).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(res.body["code"], "UNAUTHENTICATED");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_and_refresh_tokens_are_not_access_tokens() -> Result<()> {
    let app = TestApp::offline()?;

    let res = app.get("/api/v1/students", "not-a-jwt").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let refresh = app
        .state
        .tokens
        .issue(Uuid::new_v4(), Role::Admin, "Admin", TokenKind::Refresh)?
        .token;
    let res = app.get("/api/v1/students", &refresh).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bearer_header_is_accepted_in_place_of_the_cookie() -> Result<()> {
    let app = TestApp::offline()?;
    let token = app.token(Role::Teacher);

    // A teacher passes authentication and is then stopped by the role check
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/admins")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn refresh_without_a_cookie_is_rejected() -> Result<()> {
    let app = TestApp::offline()?;
    let res = app.request(Method::POST, "/api/v1/auth/refresh", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // An access token in the refresh slot does not verify either
    let access = app.token(Role::Teacher);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/refresh")
        .header(header::COOKIE, format!("{}={}", REFRESH_COOKIE, access))
        .body(Body::empty())?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_both_cookies() -> Result<()> {
    let app = TestApp::offline()?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/logout")
        .header(header::COOKIE, format!("{}=a; {}=b", ACCESS_COOKIE, REFRESH_COOKIE))
        .body(Body::empty())?;
    let res = app.send(request).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.cookie(ACCESS_COOKIE).as_deref(), Some(""));
    assert_eq!(res.cookie(REFRESH_COOKIE).as_deref(), Some(""));
    Ok(())
}

#[tokio::test]
async fn login_rejects_a_malformed_body() -> Result<()> {
    let app = TestApp::offline()?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");

    let res = app
        .request(Method::POST, "/api/v1/auth/login", None, Some(json!({ "email": "a@b.co" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field_errors"]["password"], "This field is required");
    Ok(())
}

#[tokio::test]
async fn teachers_cannot_reach_staff_routes() -> Result<()> {
    let app = TestApp::offline()?;
    let teacher = app.token(Role::Teacher);
    let id = Uuid::new_v4();

    let student = json!({ "name": "Mina", "manager": "km", "platform": "zoom" });
    let checks = [
        (Method::POST, "/api/v1/students".to_string(), Some(student)),
        (Method::DELETE, format!("/api/v1/students/{}", id), None),
        (Method::GET, "/api/v1/teachers".to_string(), None),
        (Method::POST, "/api/v1/books".to_string(), Some(json!({ "title": "Phonics 1" }))),
        (Method::GET, "/api/v1/applications".to_string(), None),
        (Method::DELETE, format!("/api/v1/payout/{}", id), None),
        (Method::POST, "/api/v1/notification".to_string(), Some(json!({ "role": "teacher", "title": "t", "body": "b" }))),
    ];

    for (method, uri, body) in checks {
        let res = app.request(method.clone(), &uri, Some(&teacher), body).await?;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }
    Ok(())
}

#[tokio::test]
async fn only_super_admins_manage_admins() -> Result<()> {
    let app = TestApp::offline()?;
    for role in [Role::Teacher, Role::Admin] {
        let token = app.token(role);
        let res = app.get("/api/v1/admins", &token).await?;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{}", role);
    }

    let id = Uuid::new_v4();
    let token = app.token_for(id, Role::SuperAdmin);
    let res = app.delete(&format!("/api/v1/admins/{}", id), &token).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admins_register_teachers_only() -> Result<()> {
    let app = TestApp::offline()?;
    let admin = app.token(Role::Admin);
    let body = json!({
        "name": "New Admin",
        "email": "new.admin@academy.test",
        "password": "long-enough-password",
        "role": "admin"
    });
    let res = app.post("/api/v1/auth/register", &admin, body).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let teacher = app.token(Role::Teacher);
    let body = json!({
        "name": "New Teacher",
        "email": "new.teacher@academy.test",
        "password": "long-enough-password",
        "role": "teacher"
    });
    let res = app.post("/api/v1/auth/register", &teacher, body).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}
