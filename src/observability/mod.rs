use std::time::Instant;

use http::{Method, StatusCode};
use tracing_subscriber::EnvFilter;

use crate::config::FeaturesConfig;
use crate::state::RequestId;

/// Map a configured log level onto a tracing filter directive.
///
/// - "DISABLED" -> `None` (no subscriber installed)
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, WARN, ERROR)
#[must_use]
pub fn tracing_directive(log_level: &str) -> Option<String> {
    let level = log_level.to_uppercase();
    match level.as_str() {
        "DISABLED" => None,
        "WARNING" => Some("WARN".to_string()),
        "CRITICAL" => Some("ERROR".to_string()),
        _ => Some(level),
    }
}

/// Initialize the tracing subscriber from the feature settings.
pub fn init_tracing(features: &FeaturesConfig) {
    let Some(directive) = tracing_directive(&features.log_level) else {
        return;
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("INFO"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if features.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// One line per handled request.
pub fn log_request_complete(
    request_id: RequestId,
    method: &Method,
    path: &str,
    route: &str,
    status: StatusCode,
    start_time: Instant,
) {
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path,
        route,
        status = status.as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_directive_mapping() {
        assert_eq!(tracing_directive("disabled"), None);
        assert_eq!(tracing_directive("WARNING").as_deref(), Some("WARN"));
        assert_eq!(tracing_directive("critical").as_deref(), Some("ERROR"));
        assert_eq!(tracing_directive("debug").as_deref(), Some("DEBUG"));
    }
}
