//! Translation of handler and store failures into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

/// Every way a request can fail.
///
/// Request handling builds `MissingField` and `MalformedBody` itself; store
/// failures arrive through `From`. All of them become a response in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("name or number missing")]
    MissingField,

    #[error("malformatted body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    Cast(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField
            | ApiError::MalformedBody(_)
            | ApiError::Cast(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response body
    fn public_message(&self) -> String {
        match self {
            ApiError::MissingField => "name or number missing".to_string(),
            ApiError::MalformedBody(_) => "malformatted body".to_string(),
            ApiError::Cast(_) => "malformatted id".to_string(),
            ApiError::Validation(message) => message.clone(),
            ApiError::Unknown(_) => "internal server error".to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Cast { .. } => ApiError::Cast(err.to_string()),
            StoreError::Validation(validation) => ApiError::Validation(validation.to_string()),
            other => ApiError::Unknown(other.to_string()),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        ApiError::Unknown(format!("template rendering failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Fallback for every request no route or static asset answered
pub async fn unknown_endpoint() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "unknown endpoint" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{Person, PersonId, PersonSchema};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_cast_maps_to_malformatted_id() {
        let err: ApiError = StoreError::Cast {
            value: "xyz".to_string(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "malformatted id");
    }

    #[tokio::test]
    async fn test_validation_keeps_store_message() {
        let person = Person {
            id: PersonId::generate(),
            name: "Ada Lovelace".to_string(),
            number: String::new(),
        };
        let err: ApiError = StoreError::from(PersonSchema.validate(&person).unwrap_err()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Person validation failed: number: is required"
        );
    }

    #[tokio::test]
    async fn test_other_store_failures_are_internal() {
        let err: ApiError = StoreError::Poisoned.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "internal server error");
    }

    #[tokio::test]
    async fn test_missing_field_body() {
        let response = ApiError::MissingField.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "name or number missing");
    }

    #[tokio::test]
    async fn test_unknown_endpoint_body() {
        let response = unknown_endpoint().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "unknown endpoint");
    }
}
