//! HTTP error surface. Every failure leaves the server as
//! `{"success": false, "message": "..."}` with a status from the catalogue
//! below, so clients never have to parse two error shapes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use service::ServiceError;
use tracing::error;

/// A failed request: status plus the client-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Authentication required".to_string(),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_)
            | ServiceError::Signature
            | ServiceError::InvalidTransition
            | ServiceError::PaymentRequired(_)
            | ServiceError::InvalidState => StatusCode::BAD_REQUEST,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Db(_) | ServiceError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage failures carry connection details; log them here and hand
        // the client a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {err}");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use model::PaymentStatus;

    use super::*;

    #[test]
    fn statuses_follow_the_error_catalogue() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Signature, StatusCode::BAD_REQUEST),
            (ServiceError::InvalidTransition, StatusCode::BAD_REQUEST),
            (
                ServiceError::PaymentRequired(PaymentStatus::Pending),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::InvalidState, StatusCode::BAD_REQUEST),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (
                ServiceError::NotFound("Booking not found"),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Unexpected("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let api = ApiError::from(ServiceError::Unexpected("password=hunter2".into()));
        assert_eq!(api.message(), "Internal server error");
    }

    #[test]
    fn client_errors_keep_their_messages() {
        let api = ApiError::from(ServiceError::InvalidTransition);
        assert_eq!(api.message(), "This booking is already completed");
    }
}
