mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let app = TestApp::offline()?;
    let res = app.request(Method::GET, "/", None, None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["name"], "academy-api");
    assert!(res.body["data"]["endpoints"]["chat"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_an_unreachable_database() -> Result<()> {
    let app = TestApp::offline()?;
    let res = app.request(Method::GET, "/health", None, None).await?;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["data"]["database"], "down");
    assert_eq!(res.body["data"]["cache"]["status"], "up");
    assert_eq!(res.body["data"]["cache"]["backend"], "memory");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() -> Result<()> {
    let app = TestApp::offline()?;
    let res = app.request(Method::GET, "/api/v1/nothing-here", None, None).await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn cors_allows_the_configured_frontend_with_credentials() -> Result<()> {
    let app = TestApp::offline()?;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/auth/login")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())?;
    let res = app.send(request).await?;

    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).and_then(|v| v.to_str().ok()),
        Some("true")
    );
    Ok(())
}

#[tokio::test]
async fn missing_uploads_are_not_found() -> Result<()> {
    let app = TestApp::offline()?;
    let res = app.request(Method::GET, "/uploads/recordings/missing.mp4", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
