//! Decoded query parameters.

use percent_encoding::percent_decode_str;

/// Query parameters in request order.
///
/// Keys are case-sensitive. A parameter without `=` (a subresource marker
/// such as `?acl`) has an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// # Examples
    ///
    /// ```
    /// use s3gate_http::query::QueryParams;
    ///
    /// let params = QueryParams::parse("acl&prefix=photos%2F2024&max-keys=10");
    /// assert!(params.contains("acl"));
    /// assert_eq!(params.get("prefix"), Some("photos/2024"));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('&')
                .filter(|s| !s.is_empty())
                .map(|pair| {
                    let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                    (decode(k), decode(v))
                })
                .collect(),
        )
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when `key` is present, with or without a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// All parameters in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the query string was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Percent-decode a query component, treating `+` as a space.
fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}
