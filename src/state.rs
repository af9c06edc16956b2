mod request_id;

use crate::config::{AppConfig, UpstreamFamily};
use crate::transport::{HttpTransport, PreparedUpstream};

pub use request_id::RequestId;
use request_id::RequestIdGenerator;

/// Shared application state accessible to all handlers. Read-only after start-up.
pub struct AppState {
    pub config: AppConfig,
    pub transport: HttpTransport,
    content: PreparedUpstream,
    commerce: PreparedUpstream,
    request_ids: RequestIdGenerator,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, transport: HttpTransport) -> Self {
        let content = PreparedUpstream::new(UpstreamFamily::Content, &config.upstreams.content);
        let commerce = PreparedUpstream::new(UpstreamFamily::Commerce, &config.upstreams.commerce);

        for upstream in [&content, &commerce] {
            if !upstream.has_credential() {
                let family = upstream.family();
                let env_name = config
                    .upstreams
                    .get(family)
                    .auth_header_env
                    .as_deref()
                    .unwrap_or_else(|| family.default_auth_env());
                tracing::warn!(
                    %family,
                    env = env_name,
                    "no upstream credential configured; requests will be sent unauthenticated"
                );
            }
        }

        Self {
            config,
            transport,
            content,
            commerce,
            request_ids: RequestIdGenerator::new(),
        }
    }

    #[must_use]
    pub fn upstream(&self, family: UpstreamFamily) -> &PreparedUpstream {
        match family {
            UpstreamFamily::Content => &self.content,
            UpstreamFamily::Commerce => &self.commerce,
        }
    }

    pub fn next_request_id(&self) -> RequestId {
        self.request_ids.next_id()
    }
}
