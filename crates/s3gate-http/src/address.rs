//! Bucket and key resolution for path-style and virtual-hosted-style
//! requests.
//!
//! With a [`BaseDomainMatcher`] configured, a host such as
//! `photos.s3.localhost` against the base domain `s3.localhost` names the
//! bucket `photos` and the whole path is the key. A host equal to a base
//! domain, an IP literal, or a forced path style all fall back to
//! `/{bucket}/{key}` parsing.

use std::net::IpAddr;

use percent_encoding::percent_decode_str;
use s3gate_model::S3Error;

/// How the bucket name was carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressingStyle {
    /// `/{bucket}/{key}`.
    #[default]
    Path,
    /// `{bucket}.{base-domain}/{key}`.
    VirtualHosted,
}

/// The bucket and key a request addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Addressing style that produced this result.
    pub style: AddressingStyle,
    /// Bucket name, absent for service-level requests.
    pub bucket: Option<String>,
    /// Object key, absent for service and bucket requests.
    pub key: Option<String>,
}

/// Address resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No host was supplied.
    #[error("Host header is empty")]
    EmptyHostname,
    /// The host is not under any configured base domain.
    #[error("Host {0} does not match any configured base domain")]
    BaseDomainNotFound(String),
}

impl From<AddressError> for S3Error {
    fn from(err: AddressError) -> Self {
        S3Error::invalid_request(err.to_string())
    }
}

/// Finds the base domain a hostname belongs to.
pub trait BaseDomainMatcher: Send + Sync + std::fmt::Debug {
    /// Return the base domain that `hostname` equals or ends with
    /// (`"." + domain`), or `None`. `hostname` is lower-case without a port.
    fn match_base_domain(&self, hostname: &str) -> Option<&str>;
}

/// A fixed list of base domains; the longest match wins.
///
/// # Examples
///
/// ```
/// use s3gate_http::address::{BaseDomainMatcher, StaticBaseDomains};
///
/// let domains = StaticBaseDomains::new(["localhost", "s3.localhost"]);
/// assert_eq!(domains.match_base_domain("photos.s3.localhost"), Some("s3.localhost"));
/// assert_eq!(domains.match_base_domain("example.com"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticBaseDomains {
    domains: Vec<String>,
}

impl StaticBaseDomains {
    /// Build from domain names. Leading dots and case are normalized away.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domains: Vec<String> = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort_by_key(|d| std::cmp::Reverse(d.len()));
        domains.dedup();
        Self { domains }
    }

    /// The configured domains, longest first.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }
}

impl BaseDomainMatcher for StaticBaseDomains {
    fn match_base_domain(&self, hostname: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|domain| {
                hostname == domain.as_str()
                    || hostname
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .map(String::as_str)
    }
}

/// Resolve the bucket and key of a request.
///
/// `hostname` may carry a port. Without a matcher the request is treated as
/// path-style.
pub fn resolve(
    hostname: &str,
    path: &str,
    force_path_style: bool,
    matcher: Option<&dyn BaseDomainMatcher>,
) -> Result<ResolvedAddress, AddressError> {
    let Some(matcher) = matcher.filter(|_| !force_path_style) else {
        return Ok(parse_path_style(path));
    };

    let host = normalize_host(hostname);
    if host.is_empty() {
        return Err(AddressError::EmptyHostname);
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(parse_path_style(path));
    }

    let base = matcher
        .match_base_domain(&host)
        .ok_or_else(|| AddressError::BaseDomainNotFound(host.clone()))?;
    if host.len() == base.len() {
        return Ok(parse_path_style(path));
    }

    let bucket = &host[..host.len() - base.len() - 1];
    let key = path.strip_prefix('/').unwrap_or(path);
    Ok(ResolvedAddress {
        style: AddressingStyle::VirtualHosted,
        bucket: Some(bucket.to_owned()),
        key: non_empty(key).map(decode),
    })
}

/// Region from the host name: `s3.<region>.amazonaws.com`,
/// `<bucket>.s3.<region>.amazonaws.com` or `s3-<region>.amazonaws.com`.
///
/// # Examples
///
/// ```
/// use s3gate_http::address::region_from_host;
///
/// assert_eq!(region_from_host("s3.eu-west-1.amazonaws.com").as_deref(), Some("eu-west-1"));
/// assert_eq!(region_from_host("b.s3-us-west-2.amazonaws.com:443").as_deref(), Some("us-west-2"));
/// assert_eq!(region_from_host("s3.amazonaws.com"), None);
/// ```
#[must_use]
pub fn region_from_host(hostname: &str) -> Option<String> {
    let host = normalize_host(hostname);
    let rest = host
        .strip_suffix(".amazonaws.com.cn")
        .or_else(|| host.strip_suffix(".amazonaws.com"))?;
    let mut labels = rest.rsplit('.');
    let last = labels.next()?;
    if let Some(region) = last.strip_prefix("s3-") {
        return non_empty(region).map(str::to_owned);
    }
    match labels.next() {
        Some("s3" | "dualstack") if last != "s3" => Some(last.to_owned()),
        _ => None,
    }
}

/// Pick the request region: credential scope, then host pattern, then the
/// configured default.
#[must_use]
pub fn resolve_region(credential_region: Option<&str>, hostname: &str, default: &str) -> String {
    credential_region
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
        .or_else(|| region_from_host(hostname))
        .unwrap_or_else(|| default.to_owned())
}

/// Lower-case and strip the port, keeping IPv6 literals intact.
fn normalize_host(hostname: &str) -> String {
    let host = hostname.trim();
    let host = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.rsplit_once(':')
            .filter(|(_, port)| port.bytes().all(|b| b.is_ascii_digit()))
            .map_or(host, |(h, _)| h)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn parse_path_style(path: &str) -> ResolvedAddress {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (bucket, key) = match trimmed.split_once('/') {
        Some((bucket, key)) => (bucket, non_empty(key)),
        None => (trimmed, None),
    };
    ResolvedAddress {
        style: AddressingStyle::Path,
        bucket: non_empty(bucket).map(decode),
        key: key.map(decode),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
