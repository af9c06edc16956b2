use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::{header, HeaderValue, StatusCode};
use serde_json::json;

use crate::api::cors::apply_cors_headers;

const TEXT_PLAIN_UTF8: HeaderValue = HeaderValue::from_static("text/plain;charset=UTF-8");
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Error type used across the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid path")]
    InvalidPath,
    #[error("Not Found")]
    NotFound,
    #[error("Upstream URL error: {0}")]
    UpstreamUrl(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Upstream payload error: {0}")]
    Parse(String),
}

impl GatewayError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidPath => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Transport(_) | GatewayError::Parse(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            GatewayError::InvalidPath => "invalid_path",
            GatewayError::NotFound => "not_found",
            GatewayError::Transport(_) => "upstream_unavailable",
            GatewayError::Parse(_) => "upstream_payload_invalid",
            GatewayError::UpstreamUrl(_) => "gateway_error",
        }
    }
}

/// Routing errors keep their short plain-text bodies; everything else is a
/// JSON error object. Both carry the CORS header set so browsers can read them.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (content_type, body) = match &self {
            GatewayError::InvalidPath | GatewayError::NotFound => {
                (TEXT_PLAIN_UTF8, Body::from(self.to_string()))
            }
            GatewayError::UpstreamUrl(_) | GatewayError::Transport(_) | GatewayError::Parse(_) => {
                let payload = json!({
                    "error": {
                        "type": self.error_type(),
                        "message": self.to_string(),
                    }
                });
                (APPLICATION_JSON, Body::from(payload.to_string()))
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        apply_cors_headers(headers);
        headers.insert(header::CONTENT_TYPE, content_type);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_path_is_plain_400_with_cors() {
        let response = GatewayError::InvalidPath.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Invalid path");
    }

    #[tokio::test]
    async fn test_not_found_is_plain_404() {
        let response = GatewayError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_transport_error_is_json_502() {
        let response = GatewayError::Transport("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["type"], "upstream_unavailable");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::UpstreamUrl("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Parse("bad".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
