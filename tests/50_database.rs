//! End-to-end flows against a real Postgres; skipped unless TEST_DATABASE_URL is set

mod common;

use academy_api::auth::{hash_password, ACCESS_COOKIE, REFRESH_COOKIE};
use academy_api::database::models::user::User;
use academy_api::services::{NewUser, UserService};
use academy_api::types::Role;
use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{unique_email, TestApp};
use serde_json::{json, Value};

const PASSWORD: &str = "correct-horse-battery";

async fn create_user(app: &TestApp, role: Role) -> Result<(User, String)> {
    let email = unique_email(&role.to_string());
    let password_hash = hash_password(PASSWORD.to_string(), 4).await?;
    let user = UserService::new(app.state.pool.clone())
        .create(NewUser {
            name: "Test Person",
            email: &email,
            password_hash,
            role,
            phone: None,
            hourly_rate: None,
        })
        .await?;
    let token = app.token_for(user.id, role);
    Ok((user, token))
}

async fn create_student(app: &TestApp, admin: &str, teacher_id: Option<uuid::Uuid>) -> Result<Value> {
    let res = app
        .post(
            "/api/v1/students",
            admin,
            json!({ "name": "Mina Park", "manager": "km", "platform": "zoom", "teacher_id": teacher_id }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    Ok(res.body["data"].clone())
}

fn ids(page: &Value) -> Vec<String> {
    page["data"]["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn login_refresh_and_me() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (teacher, _) = create_user(&app, Role::Teacher).await?;

    let res = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": teacher.email, "password": "wrong-password" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": teacher.email.to_uppercase(), "password": PASSWORD })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert!(res.body["data"].get("password_hash").is_none());
    let access = res.cookie(ACCESS_COOKIE).unwrap_or_default();
    let refresh = res.cookie(REFRESH_COOKIE).unwrap_or_default();
    assert!(!access.is_empty() && !refresh.is_empty());

    let res = app.get("/api/v1/auth/me", &access).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["id"], json!(teacher.id));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/refresh")
        .header(header::COOKIE, format!("{}={}", REFRESH_COOKIE, refresh))
        .body(Body::empty())?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.cookie(ACCESS_COOKIE).is_some());
    assert!(res.cookie(REFRESH_COOKIE).is_none());
    Ok(())
}

#[tokio::test]
async fn student_writes_are_visible_immediately() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (_, admin) = create_user(&app, Role::Admin).await?;

    let student = create_student(&app, &admin, None).await?;
    let id = student["id"].as_str().unwrap_or_default().to_string();
    let item = format!("/api/v1/students/{}", id);

    // Warm both the list and the item cache
    let res = app.get("/api/v1/students?search=Mina", &admin).await?;
    assert!(ids(&res.body).contains(&id));
    let res = app.get(&item, &admin).await?;
    assert_eq!(res.body["data"]["name"], "Mina Park");

    let res = app.patch(&item, &admin, json!({ "name": "Mina Kim", "status": "paused" })).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get(&item, &admin).await?;
    assert_eq!(res.body["data"]["name"], "Mina Kim");
    assert_eq!(res.body["data"]["status"], "paused");

    let res = app.delete(&item, &admin).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.get(&item, &admin).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.get("/api/v1/students?search=Mina", &admin).await?;
    assert!(!ids(&res.body).contains(&id));
    Ok(())
}

#[tokio::test]
async fn teachers_only_see_their_own_students() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (_, admin) = create_user(&app, Role::Admin).await?;
    let (teacher, teacher_token) = create_user(&app, Role::Teacher).await?;

    let mine = create_student(&app, &admin, Some(teacher.id)).await?;
    let other = create_student(&app, &admin, None).await?;

    let res = app.get("/api/v1/students", &teacher_token).await?;
    let visible = ids(&res.body);
    assert!(visible.iter().any(|id| mine["id"] == json!(id)));
    assert!(!visible.iter().any(|id| other["id"] == json!(id)));

    let res = app.get(&format!("/api/v1/students/{}", other["id"].as_str().unwrap_or_default()), &teacher_token).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn class_attendance_and_makeup_flow() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (_, admin) = create_user(&app, Role::Admin).await?;
    let (teacher, teacher_token) = create_user(&app, Role::Teacher).await?;
    let student = create_student(&app, &admin, Some(teacher.id)).await?;

    let res = app
        .post(
            "/api/v1/classes",
            &admin,
            json!({
                "kind": "single",
                "teacher_id": teacher.id,
                "student_id": student["id"],
                "title": "Reading",
                "start_time": "2026-05-04T09:00:00Z",
                "duration_minutes": 40,
                "platform": "zoom"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let class_id = res.body["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = app.get("/api/v1/notification", &teacher_token).await?;
    let titles: Vec<Value> = res.body["data"]["items"]
        .as_array()
        .map(|items| items.iter().map(|n| n["title"].clone()).collect())
        .unwrap_or_default();
    assert!(titles.contains(&json!("New class scheduled")));

    // Teachers may only change the status of their class
    let res = app
        .patch(&format!("/api/v1/classes/{}", class_id), &teacher_token, json!({ "title": "Other" }))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let attendance = json!({ "class_id": class_id, "status": "absent" });
    let res = app.post("/api/v1/attendance", &teacher_token, attendance.clone()).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let res = app.post("/api/v1/attendance", &teacher_token, attendance).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post(
            &format!("/api/v1/classes/{}/makeup", class_id),
            &teacher_token,
            json!({ "start_time": "2026-05-06T09:00:00Z", "reason": "Student was sick" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["data"]["kind"], "makeup");
    assert_eq!(res.body["data"]["original_class_id"], json!(class_id));

    let res = app.get(&format!("/api/v1/classes/{}", class_id), &teacher_token).await?;
    assert_eq!(res.body["data"]["status"], "missed");
    Ok(())
}

#[tokio::test]
async fn messages_thread_and_unread_counts() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (teacher, teacher_token) = create_user(&app, Role::Teacher).await?;
    let (admin, admin_token) = create_user(&app, Role::Admin).await?;

    let res = app
        .post("/api/v1/message", &admin_token, json!({ "receiver_id": teacher.id, "content": "Hello" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = app.get("/api/v1/message/conversations", &teacher_token).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.get(&format!("/api/v1/message/{}", admin.id), &teacher_token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["items"][0]["content"], "Hello");

    let res = app.get(&format!("/api/v1/message/{}", uuid::Uuid::new_v4()), &teacher_token).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn renaming_a_teacher_refreshes_conversation_names() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (teacher, teacher_token) = create_user(&app, Role::Teacher).await?;
    let (admin, admin_token) = create_user(&app, Role::Admin).await?;

    let res = app
        .post("/api/v1/message", &teacher_token, json!({ "receiver_id": admin.id, "content": "Question" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = app.get("/api/v1/message/conversations", &admin_token).await?;
    assert_eq!(res.body["data"][0]["user_name"], "Test Person");

    let res = app
        .patch(&format!("/api/v1/teachers/{}", teacher.id), &admin_token, json!({ "name": "Renamed Teacher" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = app.get("/api/v1/message/conversations", &admin_token).await?;
    assert_eq!(res.body["data"][0]["user_name"], "Renamed Teacher");
    Ok(())
}

#[tokio::test]
async fn reassigning_a_class_moves_its_attendance() -> Result<()> {
    let Some(app) = TestApp::with_database().await? else { return Ok(()) };
    let (_, admin) = create_user(&app, Role::Admin).await?;
    let (first, first_token) = create_user(&app, Role::Teacher).await?;
    let (second, second_token) = create_user(&app, Role::Teacher).await?;
    let student = create_student(&app, &admin, Some(first.id)).await?;

    let res = app
        .post(
            "/api/v1/classes",
            &admin,
            json!({
                "kind": "single",
                "teacher_id": first.id,
                "student_id": student["id"],
                "title": "Grammar",
                "start_time": "2026-06-01T09:00:00Z",
                "duration_minutes": 30,
                "platform": "classin"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let class_id = res.body["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = app
        .post("/api/v1/attendance", &first_token, json!({ "class_id": class_id, "status": "present" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let attendance = format!("/api/v1/attendance/{}", res.body["data"]["id"].as_str().unwrap_or_default());

    // Warm the item cache under the first teacher
    let res = app.patch(&attendance, &first_token, json!({ "note": "on time" })).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .patch(&format!("/api/v1/classes/{}", class_id), &admin, json!({ "teacher_id": second.id }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = app.patch(&attendance, &second_token, json!({ "status": "late" })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["data"]["teacher_id"], json!(second.id));
    let res = app.patch(&attendance, &first_token, json!({ "status": "absent" })).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}
