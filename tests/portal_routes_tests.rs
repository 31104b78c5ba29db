use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use rollcall::db::models::{AttendanceRecord, AttendanceStats, DatabaseStats, Student, Teacher};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let mut cfg = rollcall::config::Config::default();
    cfg.basic.insecure_cookie = true;
    let state = rollcall::CampusState::from_config(&cfg)
        .await
        .expect("failed to build state");
    rollcall::campus_router(state)
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("request failed")
}

async fn body_json<T: serde::de::DeserializeOwned>(resp: Response) -> T {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not the expected json")
}

/// `name=value` part of the session cookie, ready to send back.
fn session_cookie(resp: &Response) -> String {
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("no session cookie set")
        .to_str()
        .expect("cookie was not ascii");
    assert!(set_cookie.starts_with("rollcall_session="));
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie
        .split(';')
        .next()
        .expect("empty cookie")
        .to_string()
}

async fn login(app: &Router, portal: &str, identifier: &str, password: &str) -> String {
    let resp = send(
        app,
        json_request(
            "POST",
            &format!("/api/{portal}/login"),
            json!({ "identifier": identifier, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie(&resp)
}

#[tokio::test]
async fn student_login_accepts_roll_number_or_email() {
    let app = app().await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/students/login",
            json!({ "identifier": "cs001", "password": "alice123" }),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let _ = session_cookie(&resp);
    let student: Student = body_json(resp).await;
    assert_eq!(student.roll_no, "CS001");

    login(&app, "students", "Bob.Smith@University.edu", "bob123").await;
}

#[tokio::test]
async fn wrong_password_is_401() {
    let app = app().await;
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/students/login",
            json!({ "identifier": "CS001", "password": "nope" }),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn registration_logs_in_and_rejects_duplicates() {
    let app = app().await;
    let form = json!({
        "name": "Kim Park",
        "rollNo": "cs100",
        "email": "Kim.Park@university.edu",
        "password": "secret1",
        "confirmPassword": "secret1",
        "class": "Computer Science",
        "year": "1st Year",
        "phone": ""
    });

    let resp = send(
        &app,
        json_request("POST", "/api/students/register", form.clone(), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cookie = session_cookie(&resp);
    let student: Student = body_json(resp).await;
    assert_eq!(student.roll_no, "CS100");
    assert_eq!(student.email, "kim.park@university.edu");

    let resp = send(&app, get_request("/api/students/me", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, json_request("POST", "/api/students/register", form, None)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/students/register",
            json!({
                "name": "Lee Min",
                "rollNo": "cs101",
                "email": "lee@university.edu",
                "password": "secret1",
                "confirmPassword": "secret2",
                "class": "Computer Science",
                "year": "1st Year"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Passwords do not match");
}

#[tokio::test]
async fn marking_attendance_twice_keeps_one_record() {
    let app = app().await;
    let cookie = login(&app, "students", "CS004", "david123").await;
    let before: Vec<AttendanceRecord> =
        body_json(send(&app, get_request("/api/students/4/attendance", None)).await).await;

    let mark = json!({ "date": "2030-01-15", "subject": "Networks" });
    for _ in 0..2 {
        let resp = send(
            &app,
            json_request("POST", "/api/attendance", mark.clone(), Some(&cookie)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let after: Vec<AttendanceRecord> =
        body_json(send(&app, get_request("/api/students/4/attendance", None)).await).await;
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0].subject.as_deref(), Some("Networks"));

    let stats: AttendanceStats =
        body_json(send(&app, get_request("/api/students/4/stats", None)).await).await;
    assert_eq!(stats.total_days as usize, after.len());
}

#[tokio::test]
async fn attendance_needs_a_student_session() {
    let app = app().await;
    let resp = send(
        &app,
        json_request("POST", "/api/attendance", json!({}), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let teacher = login(&app, "teachers", "T001", "teacher123").await;
    let resp = send(
        &app,
        json_request("POST", "/api/attendance", json!({}), Some(&teacher)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboards_follow_the_session_role() {
    let app = app().await;

    let resp = send(&app, get_request("/api/teachers/me", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "teachers", "sarah.johnson@university.edu", "teacher123").await;
    let resp = send(&app, get_request("/api/teachers/me", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let dashboard: Value = body_json(resp).await;
    assert_eq!(dashboard["teacher"]["employeeId"], "T001");
    assert_eq!(dashboard["attendance"].as_array().map(Vec::len), Some(10));
    assert_eq!(dashboard["database"]["totalStudents"], 10);

    let resp = send(&app, get_request("/api/students/me", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tampered_cookie_is_not_a_session() {
    let app = app().await;
    let resp = send(
        &app,
        get_request("/api/students/me", Some("rollcall_session=forged")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn directory_and_stats_routes() {
    let app = app().await;

    let students: Vec<Student> =
        body_json(send(&app, get_request("/api/students/search?q=chen", None)).await).await;
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].roll_no, "IT001");

    let resp = send(&app, get_request("/api/students/roll/it002", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, get_request("/api/students/999", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let db: DatabaseStats =
        body_json(send(&app, get_request("/api/database/stats", None)).await).await;
    assert_eq!(db.total_students, 10);
    assert!(db.average_attendance <= 100);

    let teachers: Vec<Teacher> =
        body_json(send(&app, get_request("/api/teachers", None)).await).await;
    assert_eq!(teachers.len(), 5);
    assert_eq!(teachers[0].employee_id, "T001");

    let departments: Vec<String> =
        body_json(send(&app, get_request("/api/teachers/departments", None)).await).await;
    assert!(departments.windows(2).all(|w| w[0] < w[1]));

    let verified: Value = body_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/teachers/verify",
                json!({ "employeeId": "t002", "email": "MICHAEL.CHEN@university.edu" }),
                None,
            ),
        )
        .await,
    )
    .await;
    assert_eq!(verified["verified"], true);
}

#[tokio::test]
async fn teachers_edit_only_their_own_profile() {
    let app = app().await;
    let cookie = login(&app, "teachers", "T002", "teacher123").await;

    let resp = send(
        &app,
        json_request("PATCH", "/api/teachers/1", json!({ "phone": "+1" }), Some(&cookie)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
        &app,
        json_request(
            "PATCH",
            "/api/teachers/2",
            json!({ "email": "sarah.johnson@university.edu" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(
        &app,
        json_request(
            "PATCH",
            "/api/students/3",
            json!({ "year": "4th Year" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let student: Student = body_json(resp).await;
    assert_eq!(student.year, "4th Year");
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = app().await;
    let cookie = login(&app, "students", "CS002", "bob123").await;
    let resp = send(&app, json_request("POST", "/api/logout", json!({}), Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(set_cookie.starts_with("rollcall_session="));
    assert!(set_cookie.contains("Max-Age=0"));
}
