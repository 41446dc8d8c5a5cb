//! Canonical request construction for AWS Signature Version 4.
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```

use std::collections::BTreeMap;

use http::HeaderMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Characters left unencoded in canonical URI segments: `A-Z a-z 0-9 - _ . ~`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The pieces of a request that are covered by a SigV4 signature.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    method: String,
    uri: String,
    query: String,
    headers: String,
    signed_headers: String,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical form of a request.
    ///
    /// `path` and `query` are the raw (still percent-encoded) request target
    /// components. Every name in `signed_headers` must be present in `headers`.
    pub fn new(
        method: &str,
        path: &str,
        query: &str,
        headers: &HeaderMap,
        signed_headers: &[String],
        payload_hash: &str,
    ) -> Result<Self, AuthError> {
        let pairs = collect_signed_headers(headers, signed_headers)?;
        let names: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
        Ok(Self {
            method: method.to_owned(),
            uri: build_canonical_uri(path),
            query: build_canonical_query_string(query),
            headers: build_canonical_headers(&pairs, &names),
            signed_headers: build_signed_headers_string(&names),
            payload_hash: payload_hash.to_owned(),
        })
    }

    /// Hex SHA-256 of the canonical request, as used in the string to sign.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl std::fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n\n{}\n{}",
            self.method, self.uri, self.query, self.headers, self.signed_headers, self.payload_hash
        )
    }
}

/// Canonical URI: every path segment percent-decoded and re-encoded.
///
/// S3 does not normalize `.`/`..` segments or double-encode. Empty paths
/// are `/`.
///
/// # Examples
///
/// ```
/// use s3gate_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
/// assert_eq!(build_canonical_uri("/a%20b/c d"), "/a%20b/c%20d");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical query string: raw `key=value` pairs sorted by key, then value.
///
/// Values are kept exactly as the client sent them, since that is the
/// encoding it signed. A key without `=` is written as `key=`.
///
/// # Examples
///
/// ```
/// use s3gate_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string("b=2&acl&a=1"), "a=1&acl=&b=2");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical headers: the signed headers, lower-case, sorted, one per line.
///
/// Values are trimmed and inner whitespace runs collapse to one space.
/// Repeated headers are joined with `,`. No trailing newline.
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    let mut values: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = collapse_whitespace(value.trim());
        values
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let mut names: Vec<String> = signed_headers
        .iter()
        .map(|n| n.to_ascii_lowercase())
        .collect();
    names.sort_unstable();
    names.dedup();

    names
        .iter()
        .filter_map(|name| values.get(name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `SignedHeaders` value: sorted header names joined with `;`.
///
/// # Examples
///
/// ```
/// use s3gate_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(build_signed_headers_string(&["x-amz-date", "host"]), "host;x-amz-date");
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.join(";")
}

/// Look up every signed header, including repeated values.
fn collect_signed_headers<'a>(
    headers: &'a HeaderMap,
    signed_headers: &'a [String],
) -> Result<Vec<(&'a str, &'a str)>, AuthError> {
    let mut pairs = Vec::with_capacity(signed_headers.len());
    for name in signed_headers {
        let mut found = false;
        for value in headers.get_all(name.as_str()) {
            let value = value
                .to_str()
                .map_err(|_| AuthError::MissingHeader(name.clone()))?;
            pairs.push((name.as_str(), value));
            found = true;
        }
        if !found {
            return Err(AuthError::MissingHeader(name.clone()));
        }
    }
    Ok(pairs)
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
            }
            prev_was_space = true;
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
