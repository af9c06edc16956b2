use axum::response::Response;

use crate::api::common::forward;
use crate::config::UpstreamFamily;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::state::AppState;

/// `GET {base}/products[/...]`: commerce passthrough. `upstream_path` keeps the
/// caller's path shape (`/products`, `/products/31`, `/products/31/variations`).
///
/// Relays the family's configured pagination headers; by default these are the
/// WordPress-style `X-WP-*` names, which WooCommerce also emits.
pub(crate) async fn forward_products(
    state: &AppState,
    upstream_path: &str,
    raw_query: Option<&str>,
) -> Result<Response, GatewayError> {
    let upstream = state.upstream(UpstreamFamily::Commerce);
    let params = QueryParams::parse(raw_query);
    forward(state, upstream, upstream_path, &params, upstream.relay_headers()).await
}
