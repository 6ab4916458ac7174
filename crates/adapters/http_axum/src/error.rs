//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use occupancy_timer_domain::error::OccupancyError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`OccupancyError`] to an HTTP response with appropriate status code.
pub struct ApiError(OccupancyError);

impl From<OccupancyError> for ApiError {
    fn from(err: OccupancyError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            OccupancyError::Validation(_) => StatusCode::BAD_REQUEST,
            OccupancyError::NotFound(_) => StatusCode::NOT_FOUND,
            OccupancyError::Read(_) | OccupancyError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
