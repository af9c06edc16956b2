//! Sticky-post handling for the first page of the post listing.
//!
//! Phase 1 runs before the primary listing call: a probe decides whether one
//! slot of the page must be reserved for a sticky post. Phase 2 runs alongside
//! the primary call: the sticky post is fetched with embeds and prepended to
//! the primary result.

use bytes::Bytes;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::api::posts::POSTS_PATH;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::state::AppState;
use crate::transport::{PreparedUpstream, UpstreamResponse};

fn sticky_params(embed: bool) -> QueryParams {
    let mut params: QueryParams = [("sticky", "true"), ("per_page", "1")].into_iter().collect();
    if embed {
        params.append("_embed", "");
    }
    params
}

/// Phase 1: the `per_page` to send upstream for a first-page listing.
///
/// A failed or unreadable probe counts as "no sticky post".
pub(crate) async fn reserve_sticky_slot(
    state: &AppState,
    upstream: &PreparedUpstream,
    requested_per_page: u32,
) -> u32 {
    match probe_sticky_count(state, upstream).await {
        Ok(0) => requested_per_page,
        Ok(_) => requested_per_page.saturating_sub(1),
        Err(err) => {
            tracing::warn!(error = %err, "sticky probe failed; keeping requested per_page");
            requested_per_page
        }
    }
}

async fn probe_sticky_count(
    state: &AppState,
    upstream: &PreparedUpstream,
) -> Result<usize, GatewayError> {
    let url = upstream.endpoint_url(POSTS_PATH, &sticky_params(false))?;
    let response = state
        .transport
        .get(&url, upstream.request_headers())
        .await?;
    count_items(&response.body)
}

/// Number of items in a JSON array body. Any other JSON value counts as zero.
pub(crate) fn count_items(body: &[u8]) -> Result<usize, GatewayError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(items)) => Ok(items.len()),
        Ok(_) => Ok(0),
        Err(err) => Err(GatewayError::Parse(format!("sticky probe body: {err}"))),
    }
}

/// Phase 2: fetch the sticky post with embedded resources.
pub(crate) async fn fetch_sticky(
    state: &AppState,
    upstream: &PreparedUpstream,
) -> Result<UpstreamResponse, GatewayError> {
    let url = upstream.endpoint_url(POSTS_PATH, &sticky_params(true))?;
    state.transport.get(&url, upstream.request_headers()).await
}

/// Prepend the items of `sticky_body` to those of `primary_body`.
///
/// Returns `Ok(None)` when there is nothing to prepend. Item bytes are copied
/// verbatim; only the surrounding array is rebuilt.
///
/// # Errors
///
/// Returns [`GatewayError::Parse`] when either body is not a JSON array.
pub fn merge_sticky(sticky_body: &[u8], primary_body: &[u8]) -> Result<Option<Vec<u8>>, GatewayError> {
    if sticky_body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let sticky: Vec<&RawValue> = serde_json::from_slice(sticky_body)
        .map_err(|err| GatewayError::Parse(format!("sticky posts body: {err}")))?;
    if sticky.is_empty() {
        return Ok(None);
    }
    let primary: Vec<&RawValue> = serde_json::from_slice(primary_body)
        .map_err(|err| GatewayError::Parse(format!("post listing body: {err}")))?;

    let mut combined = Vec::with_capacity(sticky.len() + primary.len());
    combined.extend(sticky);
    combined.extend(primary);
    serde_json::to_vec(&combined)
        .map(Some)
        .map_err(|err| GatewayError::Parse(format!("merged listing: {err}")))
}

/// The body returned for a first-page listing. Falls back to the primary body
/// verbatim whenever the merge cannot be applied.
pub(crate) fn merged_body(
    primary: &UpstreamResponse,
    sticky: Result<UpstreamResponse, GatewayError>,
) -> Bytes {
    if !primary.is_success() {
        return primary.body.clone();
    }
    let sticky = match sticky {
        Ok(sticky) if sticky.is_success() => sticky,
        Ok(sticky) => {
            tracing::warn!(
                status = sticky.status.as_u16(),
                "sticky fetch returned an error status; serving listing without it"
            );
            return primary.body.clone();
        }
        Err(err) => {
            tracing::warn!(error = %err, "sticky fetch failed; serving listing without it");
            return primary.body.clone();
        }
    };

    match merge_sticky(&sticky.body, &primary.body) {
        Ok(Some(merged)) => Bytes::from(merged),
        Ok(None) => primary.body.clone(),
        Err(err) => {
            tracing::warn!(error = %err, "sticky merge skipped; relaying upstream body verbatim");
            primary.body.clone()
        }
    }
}
