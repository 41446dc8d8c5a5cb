//! S3 response body types supporting buffered, empty and streaming modes.
//!
//! This module provides [`S3ResponseBody`], the HTTP response body type used throughout
//! the S3 HTTP service. It supports three modes:
//!
//! - **Buffered**: For XML payloads, error bodies, and in-memory objects.
//! - **Empty**: For responses with no body content (e.g., 204 No Content, HEAD responses).
//! - **Streaming**: For chunked responses. The body has no known length, so hyper
//!   frames it with HTTP/1.1 chunked transfer encoding.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body::Frame;
use http_body_util::Full;
use s3gate_model::output::BlobStream;

/// S3 response body supporting buffered, empty and streaming modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http_body_util::BodyExt;
/// use s3gate_http::S3ResponseBody;
///
/// # tokio_test::block_on(async {
/// let frames = vec![Ok(Bytes::from("hello, ")), Ok(Bytes::from("world"))];
/// let body = S3ResponseBody::from_stream(futures::stream::iter(frames));
/// let data = body.collect().await.unwrap().to_bytes();
/// assert_eq!(data.as_ref(), b"hello, world");
/// # });
/// ```
#[derive(Default)]
pub enum S3ResponseBody {
    /// Buffered body: XML payloads, error bodies, raw bytes.
    Buffered(Full<Bytes>),
    /// Empty body for 204 responses, DELETE confirmations, HEAD responses, etc.
    #[default]
    Empty,
    /// Stream of frames written as they are produced.
    Streaming(BlobStream),
}

impl std::fmt::Debug for S3ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Empty => f.write_str("Empty"),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

impl S3ResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a buffered body from an XML byte vector.
    #[must_use]
    pub fn from_xml(xml: Vec<u8>) -> Self {
        Self::Buffered(Full::new(Bytes::from(xml)))
    }

    /// Create a streaming body.
    #[must_use]
    pub fn from_stream(
        stream: impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    ) -> Self {
        Self::Streaming(Box::pin(stream))
    }
}

impl http_body::Body for S3ResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
            Self::Streaming(stream) => stream
                .as_mut()
                .poll_next(cx)
                .map(|item| item.map(|res| res.map(Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
            Self::Streaming(_) => false,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
            Self::Streaming(_) => http_body::SizeHint::default(),
        }
    }
}
