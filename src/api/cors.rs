use axum::body::Body;
use axum::response::Response;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue, StatusCode};

const ALLOW_ORIGIN: HeaderValue = HeaderValue::from_static("*");
const ALLOW_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, OPTIONS");
const ALLOW_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type");
const EXPOSE_HEADERS: HeaderValue =
    HeaderValue::from_static("X-WP-Total, X-WP-TotalPages, X-WC-Total, X-WC-TotalPages");
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Insert the CORS header set carried by every gateway response.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS);
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS);
    headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, EXPOSE_HEADERS);
}

/// CORS headers plus `Content-Type: application/json`.
#[must_use]
pub fn json_response_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(8);
    headers.insert(CONTENT_TYPE, APPLICATION_JSON);
    apply_cors_headers(&mut headers);
    headers
}

/// `204 No Content` answer to a CORS preflight. Never touches an upstream.
#[must_use]
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    *response.headers_mut() = json_response_headers();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preflight_is_empty_204_with_cors() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(
            headers[ACCESS_CONTROL_EXPOSE_HEADERS],
            "X-WP-Total, X-WP-TotalPages, X-WC-Total, X-WC-TotalPages"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_json_headers_include_content_type() {
        let headers = json_response_headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers.len(), 5);
    }
}
