//! s3gate demo server: the s3gate protocol engine over an in-memory store.
//!
//! # Usage
//!
//! ```text
//! S3GATE_LISTEN=0.0.0.0:4566 s3gate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3GATE_LISTEN` | `0.0.0.0:4566` | Bind address |
//! | `S3GATE_BASE_DOMAINS` | `s3.localhost,localhost` | Virtual hosting domains |
//! | `S3GATE_FORCE_PATH_STYLE` | `false` | Ignore the `Host` header for addressing |
//! | `S3GATE_ENFORCE_SIGNATURES` | `false` | Verify SigV4 signatures |
//! | `S3GATE_ACCESS_KEY` / `S3GATE_SECRET_KEY` | `test` / `test` | Accepted credentials |
//! | `DEFAULT_REGION` | `us-east-1` | Fallback region |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

// S3Error is the Result error of every store call.
#![allow(clippy::result_large_err)]

mod backend;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use s3gate_auth::StaticCredentialProvider;
use s3gate_http::address::StaticBaseDomains;
use s3gate_http::service::{S3HttpConfig, S3HttpService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::backend::MemoryStore;
use crate::config::{LogFormat, ServerConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level filter: {}", config.log_level))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

fn build_http_config(config: &ServerConfig) -> S3HttpConfig {
    S3HttpConfig {
        force_path_style: config.force_path_style,
        enforce_signatures: config.enforce_signatures,
        default_region: config.default_region.clone(),
        ..S3HttpConfig::default()
    }
}

fn build_service(config: &ServerConfig, store: &Arc<MemoryStore>) -> S3HttpService {
    let service = S3HttpService::new(backend::callbacks(store), build_http_config(config))
        .with_base_domains(StaticBaseDomains::new(config.base_domains.iter().cloned()));
    if config.enforce_signatures {
        info!(access_key = %config.access_key, "signature verification enabled");
        service.with_credential_provider(StaticCredentialProvider::single(
            config.access_key.clone(),
            config.secret_key.clone(),
        ))
    } else {
        service
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: S3HttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    init_tracing(&config)?;

    info!(
        listen = %config.listen,
        base_domains = ?config.base_domains,
        force_path_style = config.force_path_style,
        enforce_signatures = config.enforce_signatures,
        version = VERSION,
        "starting s3gate server",
    );

    let store = Arc::new(MemoryStore::new());
    for name in ["default"] {
        if let Err(err) = store.create_bucket(name, &config.default_region) {
            warn!(bucket = name, error = %err, "could not create seed bucket");
        }
    }
    let service = build_service(&config, &store);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};

    use super::*;

    fn test_service(config: &ServerConfig) -> S3HttpService {
        build_service(config, &Arc::new(MemoryStore::new()))
    }

    async fn send(
        service: &S3HttpService,
        method: &str,
        uri: &str,
        host: &str,
        body: &'static str,
    ) -> (http::StatusCode, http::HeaderMap, String) {
        let request = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("host", host)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap();
        let response = service.handle(request).await;
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_should_build_http_config_from_server_config() {
        let config = ServerConfig::builder()
            .force_path_style(true)
            .default_region("eu-central-1".into())
            .build();
        let http_config = build_http_config(&config);
        assert!(http_config.force_path_style);
        assert!(!http_config.enforce_signatures);
        assert_eq!(http_config.default_region, "eu-central-1");
        assert_eq!(http_config.server_name, "s3gate");
    }

    #[tokio::test]
    async fn test_should_serve_virtual_hosted_object_round_trip() {
        let service = test_service(&ServerConfig::default());
        let host = "localhost:4566";

        let (status, _, _) = send(&service, "PUT", "/photos", host, "").await;
        assert_eq!(status, http::StatusCode::OK);

        let vhost = "photos.s3.localhost:4566";
        let (status, headers, _) = send(&service, "PUT", "/cat.txt", vhost, "meow meow").await;
        assert_eq!(status, http::StatusCode::OK);
        assert!(headers.contains_key("etag"));

        let (status, headers, body) = send(&service, "GET", "/photos/cat.txt", host, "").await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(body, "meow meow");
        assert_eq!(headers.get("content-length").unwrap(), "9");

        let (status, _, body) = send(&service, "GET", "/photos?list-type=2", host, "").await;
        assert_eq!(status, http::StatusCode::OK);
        assert!(body.contains("<Key>cat.txt</Key>"));
        assert!(body.contains("<KeyCount>1</KeyCount>"));

        let (status, _, _) = send(&service, "DELETE", "/photos/cat.txt", host, "").await;
        assert_eq!(status, http::StatusCode::NO_CONTENT);
        let (status, _, body) = send(&service, "GET", "/photos/cat.txt", host, "").await;
        assert_eq!(status, http::StatusCode::NOT_FOUND);
        assert!(body.contains("<Code>NoSuchKey</Code>"));
    }

    #[tokio::test]
    async fn test_should_report_unregistered_operations() {
        let service = test_service(&ServerConfig::default());
        let (status, _, body) = send(&service, "GET", "/default?uploads", "localhost", "").await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidRequest</Code>"));
    }

    #[tokio::test]
    async fn test_should_require_signatures_when_enforced() {
        let config = ServerConfig::builder().enforce_signatures(true).build();
        let service = test_service(&config);
        let (status, _, body) = send(&service, "GET", "/", "localhost", "").await;
        assert_eq!(status, http::StatusCode::FORBIDDEN);
        assert!(body.contains("<Code>AccessDenied</Code>"));
    }
}
