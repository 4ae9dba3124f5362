use crate::error::{ErrorCode, ErrorKind, ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use tracing::{debug, error};
use uuid::Uuid;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());

        // Internal causes stay in the log; the caller gets an id to quote.
        if self.kind() == ErrorKind::Internal {
            let correlation_id = Uuid::new_v4().to_string();
            error!(
                correlation_id = %correlation_id,
                code = ?self.code,
                error = %self,
                details = self.details.as_deref().unwrap_or(""),
                "request failed"
            );
            let body = json!({
                "code": ErrorCode::InternalError,
                "message": "internal error",
                "correlation_id": correlation_id,
            });
            return (status, Json(body)).into_response();
        }

        debug!(code = ?self.code, error = %self, "request rejected");
        (status, Json(self)).into_response()
    }
}

/// Turn a panicking handler into a generic 500 response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ServiceError::internal(format!("handler panicked: {}", message)).into_response()
}
