use axum::response::Response;

use crate::api::common::forward;
use crate::config::UpstreamFamily;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::state::AppState;

const CATEGORIES_PATH: &str = "/categories";

/// `GET {base}/categories`: flat passthrough. No pagination headers are relayed.
pub(crate) async fn list(
    state: &AppState,
    raw_query: Option<&str>,
) -> Result<Response, GatewayError> {
    let upstream = state.upstream(UpstreamFamily::Content);
    let params = QueryParams::parse(raw_query);
    forward(state, upstream, CATEGORIES_PATH, &params, &[]).await
}
