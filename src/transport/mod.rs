mod http_transport;
mod prepared_upstream;

pub use http_transport::{HttpTransport, UpstreamResponse};
pub use prepared_upstream::PreparedUpstream;
