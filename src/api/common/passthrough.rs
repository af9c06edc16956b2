use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, StatusCode};

use crate::api::cors::json_response_headers;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::state::AppState;
use crate::transport::PreparedUpstream;

/// Build the caller-facing response: upstream status and body, the CORS/JSON
/// header set, and each `relay` header the upstream actually sent.
pub(crate) fn relay_response(
    status: StatusCode,
    body: Bytes,
    upstream_headers: &HeaderMap,
    relay: &[HeaderName],
) -> Response {
    let mut headers = json_response_headers();
    for name in relay {
        // An empty upstream value counts as absent.
        if let Some(value) = upstream_headers.get(name).filter(|value| !value.is_empty()) {
            headers.insert(name.clone(), value.clone());
        }
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Single upstream `GET` relayed back verbatim (status and body untouched).
pub(crate) async fn forward(
    state: &AppState,
    upstream: &PreparedUpstream,
    path: &str,
    params: &QueryParams,
    relay: &[HeaderName],
) -> Result<Response, GatewayError> {
    let url = upstream.endpoint_url(path, params)?;
    let response = state
        .transport
        .get(&url, upstream.request_headers())
        .await?;
    Ok(relay_response(
        response.status,
        response.body,
        &response.headers,
        relay,
    ))
}
