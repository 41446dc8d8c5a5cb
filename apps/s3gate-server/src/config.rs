//! Server configuration.
//!
//! Values are loaded from environment variables by [`ServerConfig::from_env`].

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Demo server configuration.
///
/// ```text
/// S3GATE_LISTEN=127.0.0.1:9000 S3GATE_FORCE_PATH_STYLE=true s3gate-server
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address.
    #[builder(default = String::from("0.0.0.0:4566"))]
    pub listen: String,

    /// Base domains for virtual-hosted-style addressing.
    #[builder(default = vec![String::from("s3.localhost"), String::from("localhost")])]
    pub base_domains: Vec<String>,

    /// Ignore the `Host` header and always use path-style addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Reject requests whose signature does not verify.
    #[builder(default = false)]
    pub enforce_signatures: bool,

    /// Access key accepted by the server.
    #[builder(default = String::from("test"))]
    pub access_key: String,

    /// Secret key of [`access_key`](Self::access_key).
    #[builder(default = String::from("test"))]
    pub secret_key: String,

    /// Region reported when the request names none.
    #[builder(default = String::from("us-east-1"))]
    pub default_region: String,

    /// Log level filter (e.g. `"info"`, `"s3gate_http=debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Log output format.
    #[builder(default)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3GATE_LISTEN` | `0.0.0.0:4566` |
    /// | `S3GATE_BASE_DOMAINS` | `s3.localhost,localhost` |
    /// | `S3GATE_FORCE_PATH_STYLE` | `false` |
    /// | `S3GATE_ENFORCE_SIGNATURES` | `false` |
    /// | `S3GATE_ACCESS_KEY` | `test` |
    /// | `S3GATE_SECRET_KEY` | `test` |
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = var("S3GATE_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = var("S3GATE_BASE_DOMAINS") {
            config.base_domains = v
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(v) = var("S3GATE_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = var("S3GATE_ENFORCE_SIGNATURES") {
            config.enforce_signatures = parse_bool(&v);
        }
        if let Some(v) = var("S3GATE_ACCESS_KEY") {
            config.access_key = v;
        }
        if let Some(v) = var("S3GATE_SECRET_KEY") {
            config.secret_key = v;
        }
        if let Some(v) = var("DEFAULT_REGION") {
            config.default_region = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = var("LOG_FORMAT") {
            config.log_format = if v.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }

        config
    }
}

/// Accepts `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
