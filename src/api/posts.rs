use axum::response::Response;

use crate::api::common::{forward, relay_response};
use crate::api::sticky;
use crate::config::UpstreamFamily;
use crate::error::GatewayError;
use crate::query::QueryParams;
use crate::state::AppState;

pub(crate) const POSTS_PATH: &str = "/posts";

/// Which page of the listing the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListingPage {
    /// No `page` parameter, or `page=1`.
    First,
    Later,
}

impl ListingPage {
    pub(crate) fn of(params: &QueryParams) -> Self {
        match params.get("page") {
            None | Some("1") => ListingPage::First,
            Some(_) => ListingPage::Later,
        }
    }
}

/// `per_page` from the caller, or `default` when absent or without a leading
/// number. Only the leading digit run counts (`"5abc"` is 5).
pub(crate) fn requested_per_page(params: &QueryParams, default: u32) -> u32 {
    params
        .get("per_page")
        .and_then(leading_number)
        .unwrap_or(default)
}

fn leading_number(value: &str) -> Option<u32> {
    let value = value.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

fn ensure_embed(params: &mut QueryParams) {
    if !params.has("_embed") {
        params.append("_embed", "");
    }
}

/// `GET {base}/posts`: the post listing.
///
/// Page 1 reserves a slot for the sticky post and prepends it; later pages
/// exclude sticky posts so they are not shown twice.
pub(crate) async fn list(
    state: &AppState,
    raw_query: Option<&str>,
) -> Result<Response, GatewayError> {
    let upstream = state.upstream(UpstreamFamily::Content);
    let mut params = QueryParams::parse(raw_query);
    let requested = requested_per_page(&params, state.config.listing.default_per_page);

    match ListingPage::of(&params) {
        ListingPage::Later => {
            params.set("per_page", requested.to_string());
            params.set("sticky", "false");
            ensure_embed(&mut params);
            forward(state, upstream, POSTS_PATH, &params, upstream.relay_headers()).await
        }
        ListingPage::First => {
            // Phase 1: size the page before the primary call is built.
            let per_page = sticky::reserve_sticky_slot(state, upstream, requested).await;
            if per_page == 0 && requested > 0 {
                // The sticky post fills the whole page; upstream rejects per_page=0.
                let sticky = sticky::fetch_sticky(state, upstream).await?;
                return Ok(relay_response(sticky.status, sticky.body, &sticky.headers, &[]));
            }
            params.set("per_page", per_page.to_string());
            ensure_embed(&mut params);
            let primary_url = upstream.endpoint_url(POSTS_PATH, &params)?;

            // Phase 2: primary listing and sticky fetch are independent.
            let (primary, sticky) = tokio::join!(
                state.transport.get(&primary_url, upstream.request_headers()),
                sticky::fetch_sticky(state, upstream),
            );
            let primary = primary?;
            let body = sticky::merged_body(&primary, sticky);

            Ok(relay_response(
                primary.status,
                body,
                &primary.headers,
                upstream.relay_headers(),
            ))
        }
    }
}

/// `GET {base}/posts/{id}`: one post, with embeds.
pub(crate) async fn single(
    state: &AppState,
    id: &str,
    raw_query: Option<&str>,
) -> Result<Response, GatewayError> {
    let upstream = state.upstream(UpstreamFamily::Content);
    let mut params = QueryParams::parse(raw_query);
    ensure_embed(&mut params);
    let path = format!("{POSTS_PATH}/{id}");
    forward(state, upstream, &path, &params, upstream.relay_headers()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_page_detection() {
        assert_eq!(ListingPage::of(&QueryParams::parse(None)), ListingPage::First);
        assert_eq!(
            ListingPage::of(&QueryParams::parse(Some("page=1&per_page=6"))),
            ListingPage::First
        );
        assert_eq!(
            ListingPage::of(&QueryParams::parse(Some("page=2"))),
            ListingPage::Later
        );
        assert_eq!(
            ListingPage::of(&QueryParams::parse(Some("page=01"))),
            ListingPage::Later
        );
    }

    #[test]
    fn test_requested_per_page() {
        assert_eq!(requested_per_page(&QueryParams::parse(None), 12), 12);
        assert_eq!(
            requested_per_page(&QueryParams::parse(Some("per_page=3")), 12),
            3
        );
        assert_eq!(
            requested_per_page(&QueryParams::parse(Some("per_page=lots")), 12),
            12
        );
    }

    #[test]
    fn test_requested_per_page_uses_leading_digits() {
        let per_page = |raw: &str| requested_per_page(&QueryParams::parse(Some(raw)), 12);
        assert_eq!(per_page("per_page=5abc"), 5);
        assert_eq!(per_page("per_page=%207"), 7);
        assert_eq!(per_page("per_page=%2B8"), 8);
        assert_eq!(per_page("per_page=9.5"), 9);
        assert_eq!(per_page("per_page=-3"), 12);
        assert_eq!(per_page("per_page="), 12);
        assert_eq!(per_page("per_page=99999999999"), 12);
    }

    #[test]
    fn test_ensure_embed_keeps_caller_value() {
        let mut params = QueryParams::parse(Some("_embed=author"));
        ensure_embed(&mut params);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("_embed"), Some("author"));

        let mut params = QueryParams::parse(Some("page=2"));
        ensure_embed(&mut params);
        assert_eq!(params.get("_embed"), Some(""));
    }
}
