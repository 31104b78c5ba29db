use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CampusError;

/// `Json<T>` whose rejections (bad JSON, wrong content type, body over the limit)
/// are reported in the portal's error envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CampusError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(rejection)),
        }
    }
}

pub(crate) fn rejected(rejection: JsonRejection) -> CampusError {
    let status = rejection.status();
    debug!(%status, reason = %rejection.body_text(), "request body rejected");
    let message = if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        "request body too large".to_string()
    } else {
        rejection.body_text()
    };
    CampusError::Rejected(status, message)
}
