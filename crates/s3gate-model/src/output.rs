//! Results returned by object handlers that are written as headers and a
//! raw body rather than as an XML document.

use std::collections::BTreeMap;
use std::pin::Pin;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::range::ResolvedRange;

/// Boxed stream of body frames.
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Object payload returned by a read handler.
///
/// Either fully buffered or a stream of frames that is written to the
/// client with chunked transfer encoding.
pub enum StreamingBlob {
    /// In-memory payload.
    Bytes(Bytes),
    /// Streamed payload.
    Stream(BlobStream),
}

impl std::fmt::Debug for StreamingBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Default for StreamingBlob {
    fn default() -> Self {
        Self::Bytes(Bytes::new())
    }
}

impl StreamingBlob {
    /// Wrap a stream of frames.
    #[must_use]
    pub fn from_stream(
        stream: impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    ) -> Self {
        Self::Stream(Box::pin(stream))
    }

    /// Returns the buffered length, or `None` for streams.
    #[must_use]
    pub fn buffered_len(&self) -> Option<usize> {
        match self {
            Self::Bytes(b) => Some(b.len()),
            Self::Stream(_) => None,
        }
    }
}

impl From<Bytes> for StreamingBlob {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for StreamingBlob {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data.into())
    }
}

impl From<&'static str> for StreamingBlob {
    fn from(data: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(data.as_bytes()))
    }
}

/// Object attributes written as response headers on reads and `HEAD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object size in bytes.
    pub content_length: u64,
    /// `Content-Type` header.
    pub content_type: Option<String>,
    /// Quoted entity tag.
    pub e_tag: Option<String>,
    /// `Last-Modified` timestamp.
    pub last_modified: Option<DateTime<Utc>>,
    /// `x-amz-version-id` header.
    pub version_id: Option<String>,
    /// `x-amz-storage-class` header.
    pub storage_class: Option<String>,
    /// User metadata without the `x-amz-meta-` prefix.
    pub metadata: BTreeMap<String, String>,
}

/// Result of an object read.
#[derive(Debug, Default)]
pub struct GetObjectOutput {
    /// Header attributes.
    pub info: ObjectInfo,
    /// Payload.
    pub body: StreamingBlob,
    /// Set when the handler already applied the requested range to `body`.
    ///
    /// When left `None` for a range read with a buffered body, the range is
    /// applied to the body before sending.
    pub content_range: Option<ResolvedRange>,
}

/// Result of an object write or part upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Quoted entity tag of the stored object or part.
    pub e_tag: Option<String>,
    /// Version assigned by a versioned bucket.
    pub version_id: Option<String>,
}
