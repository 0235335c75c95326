use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    Internal(String),
}

impl From<tracker_application::AppError> for HttpError {
    fn from(value: tracker_application::AppError) -> Self {
        match value {
            tracker_application::AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            tracker_application::AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_application::AppError;

    #[test]
    fn app_errors_map_to_status_codes() {
        let cases = [
            (
                AppError::BadRequest("limit".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Internal(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            let response = HttpError::from(error).into_response();
            assert_eq!(response.status(), status);
        }
        assert_eq!(
            HttpError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
