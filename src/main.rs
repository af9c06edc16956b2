use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use storefront_gateway::config::{load_config, AppConfig};
use storefront_gateway::observability::init_tracing;
use storefront_gateway::routing::dispatch::{dispatch_request, normalize_base_path};
use storefront_gateway::state::AppState;
use storefront_gateway::transport::HttpTransport;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration from '{config_path}': {e}");
        eprintln!("Please copy 'config.example.yaml' to 'config.yaml' and modify as needed.");
        std::process::exit(1);
    });

    init_tracing(&config.features);
    let runtime = build_runtime(&config);
    runtime.block_on(serve(config));
}

/// Current-thread runtime when exactly one worker is configured, multi-thread otherwise.
fn build_runtime(config: &AppConfig) -> tokio::runtime::Runtime {
    let server = &config.server;
    let mut builder = match server.runtime_worker_threads {
        Some(1) => tokio::runtime::Builder::new_current_thread(),
        workers => {
            let mut builder = tokio::runtime::Builder::new_multi_thread();
            if let Some(workers) = workers {
                builder.worker_threads(workers);
            }
            builder
        }
    };
    builder.enable_io().enable_time();
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        builder.max_blocking_threads(max_blocking_threads);
    }
    builder.build().unwrap_or_else(|e| {
        eprintln!("Failed to initialize Tokio runtime: {e}");
        std::process::exit(1);
    })
}

async fn serve(config: AppConfig) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let base_path: Arc<str> = Arc::from(normalize_base_path(&config.server.base_path));

    let transport = HttpTransport::new(&config.server);
    let state = Arc::new(AppState::new(config, transport));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| {
            eprintln!("Failed to bind to {addr}: {err}");
            std::process::exit(1);
        });
    tracing::info!(%addr, base_path = %base_path, "storefront-gateway is ready to accept connections");

    let conn_builder = AutoBuilder::new(TokioExecutor::new());
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!("accept error: {err}");
                continue;
            }
        };
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("failed to enable TCP_NODELAY for {remote_addr}: {err}");
        }

        let conn_builder = conn_builder.clone();
        let state = Arc::clone(&state);
        let base_path = Arc::clone(&base_path);
        tokio::spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                dispatch_request(
                    Arc::clone(&state),
                    Arc::clone(&base_path),
                    request.map(Body::new),
                )
            });
            if let Err(err) = conn_builder
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!("failed to serve connection from {remote_addr}: {err:#}");
            }
        });
    }
}
