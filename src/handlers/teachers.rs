use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::PrivateCookieJar;

use crate::db::models::{Teacher, TeacherId, TeacherStats};
use crate::error::CampusError;
use crate::middleware::auth::{PortalSession, TeacherSession, session_cookie};
use crate::middleware::json_body::JsonBody;
use crate::router::CampusState;
use crate::types::portal::{
    LoginRequest, SearchQuery, TeacherDashboard, TeacherRegistration, TeacherUpdate,
    VerifyTeacherRequest, VerifyTeacherResponse,
};

pub async fn login(
    State(state): State<CampusState>,
    jar: PrivateCookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<Teacher>), CampusError> {
    let teacher = state
        .directory
        .authenticate_teacher(req.identifier.trim(), req.password)
        .await?
        .ok_or(CampusError::InvalidCredentials("employee ID/email"))?;
    let cookie = session_cookie(PortalSession::Teacher { id: teacher.id }, state.insecure_cookie)?;
    Ok((jar.add(cookie), Json(teacher)))
}

pub async fn register(
    State(state): State<CampusState>,
    jar: PrivateCookieJar,
    JsonBody(reg): JsonBody<TeacherRegistration>,
) -> Result<(StatusCode, PrivateCookieJar, Json<Teacher>), CampusError> {
    reg.validate()?;
    let teacher = state.directory.register_teacher(reg).await?;
    let cookie = session_cookie(PortalSession::Teacher { id: teacher.id }, state.insecure_cookie)?;
    Ok((StatusCode::CREATED, jar.add(cookie), Json(teacher)))
}

pub async fn verify(
    State(state): State<CampusState>,
    JsonBody(req): JsonBody<VerifyTeacherRequest>,
) -> Result<Json<VerifyTeacherResponse>, CampusError> {
    let verified = state
        .directory
        .verify_teacher(req.employee_id.trim(), req.email.trim())
        .await?;
    Ok(Json(VerifyTeacherResponse { verified }))
}

pub async fn list(State(state): State<CampusState>) -> Result<Json<Vec<Teacher>>, CampusError> {
    Ok(Json(state.directory.list_teachers().await?))
}

pub async fn search(
    State(state): State<CampusState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Teacher>>, CampusError> {
    let q = query.q.trim();
    if q.is_empty() {
        return list(State(state)).await;
    }
    Ok(Json(state.directory.search_teachers(q).await?))
}

pub async fn stats(State(state): State<CampusState>) -> Result<Json<TeacherStats>, CampusError> {
    Ok(Json(state.directory.teacher_stats().await?))
}

pub async fn departments(
    State(state): State<CampusState>,
) -> Result<Json<Vec<String>>, CampusError> {
    Ok(Json(state.directory.departments().await?))
}

pub async fn subjects(State(state): State<CampusState>) -> Result<Json<Vec<String>>, CampusError> {
    Ok(Json(state.directory.subjects().await?))
}

pub async fn by_department(
    State(state): State<CampusState>,
    Path(department): Path<String>,
) -> Result<Json<Vec<Teacher>>, CampusError> {
    Ok(Json(state.directory.teachers_by_department(department).await?))
}

pub async fn by_subject(
    State(state): State<CampusState>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<Teacher>>, CampusError> {
    Ok(Json(state.directory.teachers_by_subject(subject).await?))
}

pub async fn by_employee_id(
    State(state): State<CampusState>,
    Path(employee_id): Path<String>,
) -> Result<Json<Teacher>, CampusError> {
    state
        .directory
        .teacher_by_employee_id(employee_id)
        .await?
        .map(Json)
        .ok_or(CampusError::TeacherNotFound)
}

pub async fn get(
    State(state): State<CampusState>,
    Path(id): Path<TeacherId>,
) -> Result<Json<Teacher>, CampusError> {
    state
        .directory
        .teacher(id)
        .await?
        .map(Json)
        .ok_or(CampusError::TeacherNotFound)
}

/// A teacher may only edit their own profile.
pub async fn update(
    State(state): State<CampusState>,
    TeacherSession(session_id): TeacherSession,
    Path(id): Path<TeacherId>,
    JsonBody(update): JsonBody<TeacherUpdate>,
) -> Result<Json<Teacher>, CampusError> {
    if session_id != id {
        return Err(CampusError::Forbidden("edit another teacher's profile"));
    }
    state
        .directory
        .update_teacher(id, update)
        .await?
        .map(Json)
        .ok_or(CampusError::TeacherNotFound)
}

pub async fn dashboard(
    State(state): State<CampusState>,
    TeacherSession(id): TeacherSession,
) -> Result<Json<TeacherDashboard>, CampusError> {
    state
        .directory
        .teacher_dashboard(id)
        .await?
        .map(Json)
        .ok_or(CampusError::TeacherNotFound)
}
