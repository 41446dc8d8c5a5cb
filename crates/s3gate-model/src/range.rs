//! HTTP `Range` header handling for object reads.
//!
//! Parsing happens at classification time so that a malformed header is
//! rejected before any handler runs. Resolution against the object size
//! happens later, once the handler knows how large the object is.

use std::fmt;

use crate::error::{S3Error, S3ErrorCode};

/// Errors produced while parsing or resolving a byte range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The header does not follow `bytes=<first>-<last>` syntax.
    #[error("malformed range header: {0}")]
    Malformed(String),
    /// The range lies outside the object.
    #[error("range {range} not satisfiable for object of {total} bytes")]
    Unsatisfiable {
        /// The requested range as sent by the client.
        range: String,
        /// The object size.
        total: u64,
    },
}

impl From<RangeError> for S3Error {
    fn from(err: RangeError) -> Self {
        match &err {
            RangeError::Malformed(raw) => {
                S3Error::with_message(S3ErrorCode::InvalidRequest, format!("Invalid range: {raw}"))
            }
            RangeError::Unsatisfiable { range, .. } => {
                S3Error::invalid_range(range.clone()).with_source(err)
            }
        }
    }
}

/// A single byte range parsed from a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteRange {
    /// `bytes=first-last`, both inclusive.
    Bounded {
        /// First byte offset.
        first: u64,
        /// Last byte offset (inclusive).
        last: u64,
    },
    /// `bytes=first-`
    From {
        /// First byte offset.
        first: u64,
    },
    /// `bytes=-length`: the trailing `length` bytes.
    Suffix {
        /// Number of trailing bytes.
        length: u64,
    },
}

impl ByteRange {
    /// Parse a `Range` header value.
    ///
    /// Only single ranges in the `bytes` unit are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3gate_model::range::ByteRange;
    ///
    /// assert_eq!(
    ///     ByteRange::parse("bytes=0-4").unwrap(),
    ///     ByteRange::Bounded { first: 0, last: 4 }
    /// );
    /// assert!(ByteRange::parse("bytes=4-0").is_err());
    /// ```
    pub fn parse(header: &str) -> Result<Self, RangeError> {
        let malformed = || RangeError::Malformed(header.to_owned());
        let range_set = header.trim().strip_prefix("bytes=").ok_or_else(malformed)?;
        if range_set.contains(',') {
            return Err(malformed());
        }

        let (first, last) = range_set.split_once('-').ok_or_else(malformed)?;
        let (first, last) = (first.trim(), last.trim());
        let parse = |s: &str| s.parse::<u64>().map_err(|_| malformed());

        match (first.is_empty(), last.is_empty()) {
            (true, true) => Err(malformed()),
            (true, false) => {
                let length = parse(last)?;
                if length == 0 {
                    return Err(malformed());
                }
                Ok(Self::Suffix { length })
            }
            (false, true) => Ok(Self::From {
                first: parse(first)?,
            }),
            (false, false) => {
                let first = parse(first)?;
                let last = parse(last)?;
                if first > last {
                    return Err(malformed());
                }
                Ok(Self::Bounded { first, last })
            }
        }
    }

    /// Returns the raw `(first, last)` offsets as written in the header.
    #[must_use]
    pub fn bounds(&self) -> (Option<u64>, Option<u64>) {
        match *self {
            Self::Bounded { first, last } => (Some(first), Some(last)),
            Self::From { first } => (Some(first), None),
            Self::Suffix { length } => (None, Some(length)),
        }
    }

    /// Resolve against an object of `total` bytes.
    ///
    /// The last offset is clamped to the end of the object.
    pub fn resolve(&self, total: u64) -> Result<ResolvedRange, RangeError> {
        let unsatisfiable = || RangeError::Unsatisfiable {
            range: self.to_string(),
            total,
        };
        if total == 0 {
            return Err(unsatisfiable());
        }
        let (start, end) = match *self {
            Self::Bounded { first, last } => {
                if first >= total {
                    return Err(unsatisfiable());
                }
                (first, last.min(total - 1))
            }
            Self::From { first } => {
                if first >= total {
                    return Err(unsatisfiable());
                }
                (first, total - 1)
            }
            Self::Suffix { length } => (total.saturating_sub(length), total - 1),
        };
        Ok(ResolvedRange { start, end, total })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded { first, last } => write!(f, "bytes={first}-{last}"),
            Self::From { first } => write!(f, "bytes={first}-"),
            Self::Suffix { length } => write!(f, "bytes=-{length}"),
        }
    }
}

/// A byte range resolved against a concrete object size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
    /// Total object size.
    pub total: u64,
}

impl ResolvedRange {
    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false: a resolved range covers at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The `Content-Range` header value.
    #[must_use]
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_all_range_forms() {
        assert_eq!(
            ByteRange::parse("bytes=0-4").unwrap(),
            ByteRange::Bounded { first: 0, last: 4 }
        );
        assert_eq!(
            ByteRange::parse("bytes=100-").unwrap(),
            ByteRange::From { first: 100 }
        );
        assert_eq!(
            ByteRange::parse("bytes=-20").unwrap(),
            ByteRange::Suffix { length: 20 }
        );
    }

    #[test]
    fn test_should_reject_malformed_ranges() {
        for raw in [
            "0-4",
            "bytes=",
            "bytes=-",
            "bytes=a-b",
            "bytes=5-1",
            "bytes=0-1,4-5",
            "items=0-4",
            "bytes=-0",
        ] {
            assert!(
                matches!(ByteRange::parse(raw), Err(RangeError::Malformed(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_should_resolve_and_clamp_to_object_size() {
        let range = ByteRange::Bounded { first: 2, last: 100 };
        let resolved = range.resolve(10).unwrap();
        assert_eq!((resolved.start, resolved.end), (2, 9));
        assert_eq!(resolved.len(), 8);
        assert_eq!(resolved.content_range(), "bytes 2-9/10");

        let resolved = ByteRange::Suffix { length: 50 }.resolve(10).unwrap();
        assert_eq!((resolved.start, resolved.end), (0, 9));
    }

    #[test]
    fn test_should_fail_when_range_starts_past_end() {
        let err = ByteRange::From { first: 10 }.resolve(10).unwrap_err();
        assert!(matches!(err, RangeError::Unsatisfiable { total: 10, .. }));
        let s3: S3Error = err.into();
        assert_eq!(s3.code, S3ErrorCode::InvalidRange);
        assert_eq!(s3.status_code.as_u16(), 416);
    }

    #[test]
    fn test_should_convert_malformed_range_to_invalid_request() {
        let s3: S3Error = ByteRange::parse("bytes=x").unwrap_err().into();
        assert_eq!(s3.code, S3ErrorCode::InvalidRequest);
    }
}
