//! JSON extraction with field validation folded into the extractor, so
//! handlers only ever see a well-formed, validated body. Malformed JSON
//! and failed validation both surface as a 400 with the standard error
//! envelope.

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| reject(format!("Malformed request body: {}", e)))?;

        value
            .validate()
            .map_err(|e| reject(format!("Validation error: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

fn reject(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
