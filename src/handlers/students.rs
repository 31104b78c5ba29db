use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::PrivateCookieJar;
use tracing::info;

use crate::db::models::{AttendanceRecord, AttendanceStats, DatabaseStats, Student, StudentId};
use crate::error::CampusError;
use crate::middleware::auth::{PortalSession, StudentSession, TeacherSession, session_cookie};
use crate::middleware::json_body::JsonBody;
use crate::router::CampusState;
use crate::types::portal::{
    ClassQuery, LoginRequest, MarkAttendanceRequest, SearchQuery, StudentDashboard,
    StudentRegistration, StudentUpdate,
};

pub async fn login(
    State(state): State<CampusState>,
    jar: PrivateCookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<Student>), CampusError> {
    let student = state
        .directory
        .authenticate_student(req.identifier.trim(), req.password)
        .await?
        .ok_or(CampusError::InvalidCredentials("roll number/email"))?;
    let cookie = session_cookie(PortalSession::Student { id: student.id }, state.insecure_cookie)?;
    Ok((jar.add(cookie), Json(student)))
}

pub async fn register(
    State(state): State<CampusState>,
    jar: PrivateCookieJar,
    JsonBody(reg): JsonBody<StudentRegistration>,
) -> Result<(StatusCode, PrivateCookieJar, Json<Student>), CampusError> {
    reg.validate()?;
    let student = state.directory.register_student(reg).await?;
    let cookie = session_cookie(PortalSession::Student { id: student.id }, state.insecure_cookie)?;
    Ok((StatusCode::CREATED, jar.add(cookie), Json(student)))
}

pub async fn list(State(state): State<CampusState>) -> Result<Json<Vec<Student>>, CampusError> {
    Ok(Json(state.directory.list_students().await?))
}

pub async fn search(
    State(state): State<CampusState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Student>>, CampusError> {
    let q = query.q.trim();
    if q.is_empty() {
        return list(State(state)).await;
    }
    Ok(Json(state.directory.search_students(q).await?))
}

pub async fn by_class(
    State(state): State<CampusState>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Vec<Student>>, CampusError> {
    let year = query.year.filter(|y| !y.trim().is_empty());
    Ok(Json(
        state
            .directory
            .students_by_class(query.class, year)
            .await?,
    ))
}

pub async fn by_roll_no(
    State(state): State<CampusState>,
    Path(roll_no): Path<String>,
) -> Result<Json<Student>, CampusError> {
    state
        .directory
        .student_by_roll_no(roll_no)
        .await?
        .map(Json)
        .ok_or(CampusError::StudentNotFound)
}

pub async fn get(
    State(state): State<CampusState>,
    Path(id): Path<StudentId>,
) -> Result<Json<Student>, CampusError> {
    state
        .directory
        .student(id)
        .await?
        .map(Json)
        .ok_or(CampusError::StudentNotFound)
}

/// Teachers maintain student records.
pub async fn update(
    State(state): State<CampusState>,
    TeacherSession(teacher_id): TeacherSession,
    Path(id): Path<StudentId>,
    JsonBody(update): JsonBody<StudentUpdate>,
) -> Result<Json<Student>, CampusError> {
    let student = state
        .directory
        .update_student(id, update)
        .await?
        .ok_or(CampusError::StudentNotFound)?;
    info!(teacher_id, student_id = id, "student record edited");
    Ok(Json(student))
}

pub async fn attendance(
    State(state): State<CampusState>,
    Path(id): Path<StudentId>,
) -> Result<Json<Vec<AttendanceRecord>>, CampusError> {
    if state.directory.student(id).await?.is_none() {
        return Err(CampusError::StudentNotFound);
    }
    Ok(Json(state.directory.attendance_of(id).await?))
}

pub async fn stats(
    State(state): State<CampusState>,
    Path(id): Path<StudentId>,
) -> Result<Json<AttendanceStats>, CampusError> {
    state
        .directory
        .stats_of(id)
        .await?
        .map(Json)
        .ok_or(CampusError::StudentNotFound)
}

pub async fn dashboard(
    State(state): State<CampusState>,
    StudentSession(id): StudentSession,
) -> Result<Json<StudentDashboard>, CampusError> {
    state
        .directory
        .student_dashboard(id)
        .await?
        .map(Json)
        .ok_or(CampusError::StudentNotFound)
}

/// Students mark themselves present.
pub async fn mark_attendance(
    State(state): State<CampusState>,
    StudentSession(id): StudentSession,
    JsonBody(req): JsonBody<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), CampusError> {
    let record = state.directory.mark_attendance(id, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn all_stats(
    State(state): State<CampusState>,
) -> Result<Json<Vec<AttendanceStats>>, CampusError> {
    Ok(Json(state.directory.all_stats().await?))
}

pub async fn database_stats(
    State(state): State<CampusState>,
) -> Result<Json<DatabaseStats>, CampusError> {
    Ok(Json(state.directory.database_stats().await?))
}
