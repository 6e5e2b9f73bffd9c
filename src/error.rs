use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures talking to the grammar-checking service.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("grammar service unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("grammar service timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("grammar service returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("grammar service returned a non-JSON body: {reason}")]
    InvalidBody { reason: String },
}

/// Failures surfaced by the relay handler.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("request body is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request body has no string field 'text'")]
    MissingText,

    #[error(transparent)]
    Check(#[from] CheckError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MissingText => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::Check(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code placed in the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidJson { .. } => "invalid_json",
            RelayError::PayloadTooLarge { .. } => "payload_too_large",
            RelayError::MissingText => "missing_text",
            RelayError::Check(CheckError::Unreachable { .. })
            | RelayError::Check(CheckError::Timeout { .. }) => "upstream_unreachable",
            RelayError::Check(CheckError::UpstreamStatus { .. }) => "upstream_status",
            RelayError::Check(CheckError::InvalidBody { .. }) => "upstream_invalid_body",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RelayError::InvalidJson { reason: "eof".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::MissingText.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = RelayError::from(CheckError::UpstreamStatus {
            status: 401,
            body: "bad key".into(),
        });
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.code(), "upstream_status");
    }

    #[test]
    fn test_timeout_reports_as_unreachable() {
        let err = RelayError::from(CheckError::Timeout { secs: 30 });
        assert_eq!(err.code(), "upstream_unreachable");
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_error_response_is_json() {
        let response = RelayError::MissingText.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap();
        assert_eq!(content_type, "application/json");
    }
}
