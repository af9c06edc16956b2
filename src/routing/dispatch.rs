use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};

use crate::api::cors::preflight_response;
use crate::api::{categories, posts, products};
use crate::error::GatewayError;
use crate::observability::log_request_complete;
use crate::state::AppState;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RouteMatch<'a> {
    Preflight,
    PostList,
    Post { id: &'a str },
    Categories,
    Products { upstream_path: String },
    InvalidPath,
    NotFound,
}

impl RouteMatch<'_> {
    fn name(&self) -> &'static str {
        match self {
            RouteMatch::Preflight => "preflight",
            RouteMatch::PostList => "posts.list",
            RouteMatch::Post { .. } => "posts.single",
            RouteMatch::Categories => "categories",
            RouteMatch::Products { .. } => "products",
            RouteMatch::InvalidPath => "invalid_path",
            RouteMatch::NotFound => "not_found",
        }
    }
}

/// Dispatch a raw HTTP request to the matching handler.
///
/// The request body and headers are never read; in particular the caller's
/// `Authorization` header is not forwarded.
///
/// # Errors
///
/// This function currently never returns `Err` and uses `Infallible`.
pub async fn dispatch_request(
    state: Arc<AppState>,
    base_path: Arc<str>,
    request: Request<Body>,
) -> Result<Response, Infallible> {
    let started = Instant::now();
    let request_id = state.next_request_id();
    let (parts, _body) = request.into_parts();
    let path = parts.uri.path();
    let query = parts.uri.query();
    let route = match_route(&parts.method, path, base_path.as_ref());
    let route_name = route.name();

    let result = match route {
        RouteMatch::Preflight => Ok(preflight_response()),
        RouteMatch::PostList => posts::list(&state, query).await,
        RouteMatch::Post { id } => posts::single(&state, id, query).await,
        RouteMatch::Categories => categories::list(&state, query).await,
        RouteMatch::Products { upstream_path } => {
            products::forward_products(&state, &upstream_path, query).await
        }
        RouteMatch::InvalidPath => Err(GatewayError::InvalidPath),
        RouteMatch::NotFound => Err(GatewayError::NotFound),
    };

    let response = result.unwrap_or_else(|err| {
        if matches!(
            err,
            GatewayError::Transport(_) | GatewayError::UpstreamUrl(_) | GatewayError::Parse(_)
        ) {
            tracing::warn!(request_id = %request_id, route = route_name, error = %err, "upstream request failed");
        }
        err.into_response()
    });

    log_request_complete(
        request_id,
        &parts.method,
        path,
        route_name,
        response.status(),
        started,
    );
    Ok(response)
}

#[must_use]
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("/{}", trimmed.trim_end_matches('/'))
    }
}

pub(crate) fn match_route<'a>(method: &Method, path: &'a str, base_path: &str) -> RouteMatch<'a> {
    if method == Method::OPTIONS {
        return RouteMatch::Preflight;
    }

    let Some(path) = strip_base_path(path, base_path) else {
        return RouteMatch::NotFound;
    };
    let segments: Vec<&'a str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|segment| is_unsafe_segment(segment)) {
        return RouteMatch::InvalidPath;
    }

    match segments.as_slice() {
        ["posts"] => RouteMatch::PostList,
        ["posts", id] => RouteMatch::Post { id },
        ["posts", ..] => RouteMatch::InvalidPath,
        ["categories", ..] => RouteMatch::Categories,
        ["products", ..] => RouteMatch::Products {
            upstream_path: format!("/{}", segments.join("/")),
        },
        _ => RouteMatch::NotFound,
    }
}

/// Segments the upstream URL parser would resolve as path navigation: `.` and
/// `..` in any mix of literal and `%2e` spellings, or anything holding a
/// backslash, which http(s) URLs treat as a separator.
fn is_unsafe_segment(segment: &str) -> bool {
    if segment.contains('\\') {
        return true;
    }
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    if base_path.is_empty() {
        return Some(path);
    }

    let remainder = path.strip_prefix(base_path)?;
    if remainder.is_empty() {
        Some("/")
    } else if remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> RouteMatch<'_> {
        match_route(&Method::GET, path, "/api")
    }

    #[test]
    fn test_posts_routes_by_segment_count() {
        assert_eq!(route("/api/posts"), RouteMatch::PostList);
        assert_eq!(route("/api/posts/"), RouteMatch::PostList);
        assert_eq!(route("/api/posts/42"), RouteMatch::Post { id: "42" });
        assert_eq!(route("/api/posts/42/extra"), RouteMatch::InvalidPath);
    }

    #[test]
    fn test_categories_and_products() {
        assert_eq!(route("/api/categories"), RouteMatch::Categories);
        assert_eq!(
            route("/api/products"),
            RouteMatch::Products {
                upstream_path: "/products".to_string()
            }
        );
        assert_eq!(
            route("/api/products/31/variations"),
            RouteMatch::Products {
                upstream_path: "/products/31/variations".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        assert_eq!(route("/api/unknown"), RouteMatch::NotFound);
        assert_eq!(route("/api"), RouteMatch::NotFound);
        assert_eq!(route("/"), RouteMatch::NotFound);
        assert_eq!(route("/posts"), RouteMatch::NotFound);
        assert_eq!(route("/apix/posts"), RouteMatch::NotFound);
        assert_eq!(route("/api/postsx"), RouteMatch::NotFound);
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        for path in [
            "/api/products/../orders",
            "/api/products/%2e%2e/customers",
            "/api/products/31/%2E./x",
            "/api/products/./31",
            "/api/posts/..",
            "/api/posts/%2e%2e",
            "/api/posts/.%2e",
            "/api/../posts",
            "/api/categories/..",
        ] {
            assert_eq!(route(path), RouteMatch::InvalidPath, "{path}");
        }
    }

    #[test]
    fn test_backslash_segments_are_rejected() {
        assert_eq!(route("/api/products/..\\orders"), RouteMatch::InvalidPath);
    }

    #[test]
    fn test_dots_inside_segments_are_allowed() {
        assert_eq!(
            route("/api/products/sku...1"),
            RouteMatch::Products {
                upstream_path: "/products/sku...1".to_string()
            }
        );
        assert_eq!(route("/api/posts/my.post"), RouteMatch::Post { id: "my.post" });
    }

    #[test]
    fn test_options_is_preflight_everywhere() {
        for path in ["/api/posts", "/api/unknown", "/elsewhere", "/api/posts/1/2/3"] {
            assert_eq!(
                match_route(&Method::OPTIONS, path, "/api"),
                RouteMatch::Preflight
            );
        }
    }

    #[test]
    fn test_post_method_uses_same_routes() {
        assert_eq!(
            match_route(&Method::POST, "/api/posts", "/api"),
            RouteMatch::PostList
        );
    }

    #[test]
    fn test_empty_base_path() {
        assert_eq!(match_route(&Method::GET, "/posts/7", ""), RouteMatch::Post { id: "7" });
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/api/"), "/api");
        assert_eq!(normalize_base_path("api"), "/api");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("  "), "");
    }
}
