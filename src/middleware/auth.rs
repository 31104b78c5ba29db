use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use serde::{Deserialize, Serialize};

use crate::db::models::{StudentId, TeacherId};
use crate::error::CampusError;

pub const SESSION_COOKIE: &str = "rollcall_session";
const SESSION_HOURS: i64 = 12;

/// Logged-in portal user, stored JSON-encoded inside the encrypted session cookie.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum PortalSession {
    Student { id: StudentId },
    Teacher { id: TeacherId },
}

pub fn session_cookie(
    session: PortalSession,
    insecure: bool,
) -> Result<Cookie<'static>, CampusError> {
    Ok(Cookie::build((SESSION_COOKIE, serde_json::to_string(&session)?))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_HOURS))
        .build())
}

/// Removal must match the path the cookie was set with.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

pub fn read_session(jar: &PrivateCookieJar) -> Option<PortalSession> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

async fn session_from_parts<S>(parts: &mut Parts, state: &S) -> Option<PortalSession>
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
    read_session(&jar)
}

/// Requires a student session.
#[derive(Debug, Clone, Copy)]
pub struct StudentSession(pub StudentId);

impl<S> FromRequestParts<S> for StudentSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = CampusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts, state).await {
            Some(PortalSession::Student { id }) => Ok(Self(id)),
            Some(PortalSession::Teacher { .. }) => {
                Err(CampusError::Forbidden("use the student portal"))
            }
            None => Err(CampusError::Unauthenticated),
        }
    }
}

/// Requires a teacher session.
#[derive(Debug, Clone, Copy)]
pub struct TeacherSession(pub TeacherId);

impl<S> FromRequestParts<S> for TeacherSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = CampusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts, state).await {
            Some(PortalSession::Teacher { id }) => Ok(Self(id)),
            Some(PortalSession::Student { .. }) => {
                Err(CampusError::Forbidden("use the teacher portal"))
            }
            None => Err(CampusError::Unauthenticated),
        }
    }
}
