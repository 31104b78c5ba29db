use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;
use tracing::info;

use crate::middleware::auth::{read_session, removal_cookie};

pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    if let Some(session) = read_session(&jar) {
        info!(?session, "portal logout");
    }
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

pub async fn healthz() -> &'static str {
    "ok"
}
