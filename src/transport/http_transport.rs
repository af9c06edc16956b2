use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::config::ServerConfig;
use crate::error::GatewayError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_reqwest_client(
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    timeout: Duration,
    use_env_proxy: bool,
) -> Result<reqwest::Client, GatewayError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .pool_idle_timeout(pool_idle_timeout)
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if !use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| GatewayError::Transport(format!("Failed to build HTTP client: {err}")))
}

/// A fully-read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// HTTP client for the upstream REST APIs. One pooled client shared by all requests.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport with connection pooling and timeouts from the given server config.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        let pool_idle_timeout = if config.http_pool_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(config.http_pool_idle_timeout_secs))
        };

        let client = match build_reqwest_client(
            config.http_pool_max_idle_per_host.max(1),
            pool_idle_timeout,
            Duration::from_secs(config.timeout),
            config.http_use_env_proxy,
        ) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(error = %err, "failed to build configured reqwest client, falling back to default client");
                reqwest::Client::new()
            }
        };

        Self { client }
    }

    /// Issue a `GET` to an upstream URL and read the whole body.
    ///
    /// Non-2xx statuses are returned as ordinary responses; only network and
    /// body-read failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the request cannot be sent or
    /// the response body cannot be read.
    pub async fn get(
        &self,
        url: &url::Url,
        headers: &HeaderMap,
    ) -> Result<UpstreamResponse, GatewayError> {
        let started = Instant::now();
        let mut request = reqwest::Request::new(http::Method::GET, url.clone());
        *request.headers_mut() = headers.clone();

        let response = self.client.execute(request).await.map_err(|err| {
            GatewayError::Transport(format!("Upstream request to {} failed: {err}", url.path()))
        })?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(|err| {
            GatewayError::Transport(format!("Failed to read response body: {err}"))
        })?;

        tracing::debug!(
            upstream_path = url.path(),
            query = url.query().unwrap_or(""),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream call completed"
        );

        Ok(UpstreamResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
