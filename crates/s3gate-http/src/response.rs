//! The per-request response writer.
//!
//! [`S3Response`] collects status, headers and one of two mutually exclusive
//! body modes. The first body write picks the mode and freezes status and
//! headers:
//!
//! - **Buffered**: [`S3Response::send`] / [`S3Response::send_bytes`] append to
//!   an in-memory body sent with a `Content-Length`.
//! - **Chunked**: [`S3Response::send_chunk`], [`S3Response::send_final_chunk`]
//!   and [`S3Response::stream`] queue frames for a streaming body that hyper
//!   writes with chunked transfer encoding.
//!
//! [`S3Response::finish`] consumes the writer and produces the
//! `http::Response`, so a response is completed at most once.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use s3gate_model::S3Error;
use s3gate_model::output::BlobStream;

use crate::body::S3ResponseBody;

/// `Server` header value when none is configured.
pub const DEFAULT_SERVER: &str = "s3gate";

/// Response writer failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Buffered and chunked body writes were mixed.
    #[error("buffered and chunked body writes cannot be mixed")]
    ModeConflict,
    /// Status or headers were changed after the body started.
    #[error("status and headers are frozen once the body has started")]
    HeadersFrozen,
    /// A chunk was written after the final chunk.
    #[error("response body already completed")]
    AlreadySent,
    /// A header name or value is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl From<ResponseError> for std::io::Error {
    fn from(err: ResponseError) -> Self {
        std::io::Error::other(err)
    }
}

impl From<ResponseError> for S3Error {
    fn from(err: ResponseError) -> Self {
        S3Error::internal_error(err.to_string()).with_source(err)
    }
}

enum BodyMode {
    Pending,
    Buffered(BytesMut),
    Chunked {
        queued: Vec<Bytes>,
        tail: Option<BlobStream>,
        closed: bool,
    },
}

/// Response under construction.
pub struct S3Response {
    status: StatusCode,
    headers: HeaderMap,
    mode: BodyMode,
}

impl std::fmt::Debug for S3Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            BodyMode::Pending => "pending",
            BodyMode::Buffered(_) => "buffered",
            BodyMode::Chunked { .. } => "chunked",
        };
        f.debug_struct("S3Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("mode", &mode)
            .finish()
    }
}

impl Default for S3Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            mode: BodyMode::Pending,
        }
    }
}

impl S3Response {
    /// An empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Current headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// True once a body write has happened.
    #[must_use]
    pub fn is_started(&self) -> bool {
        !matches!(self.mode, BodyMode::Pending)
    }

    /// Set the status code.
    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        self.ensure_open()?;
        self.status = status;
        Ok(())
    }

    /// Set a header, replacing any previous value.
    pub fn set_header<K>(&mut self, name: K, value: &str) -> Result<(), ResponseError>
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Display,
    {
        self.ensure_open()?;
        let name = name
            .try_into()
            .map_err(|e| ResponseError::InvalidHeader(e.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ResponseError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Set `Content-Type`.
    pub fn set_content_type(&mut self, content_type: &str) -> Result<(), ResponseError> {
        self.set_header(header::CONTENT_TYPE, content_type)
    }

    /// Set `Content-Length`. Buffered bodies always send their real length.
    pub fn set_content_length(&mut self, length: u64) -> Result<(), ResponseError> {
        self.set_header(header::CONTENT_LENGTH, &length.to_string())
    }

    /// Append to the buffered body.
    pub fn send(&mut self, data: impl Into<Bytes>) -> Result<(), ResponseError> {
        if matches!(self.mode, BodyMode::Pending) {
            self.mode = BodyMode::Buffered(BytesMut::new());
        }
        match &mut self.mode {
            BodyMode::Buffered(buf) => {
                buf.extend_from_slice(&data.into());
                Ok(())
            }
            BodyMode::Chunked { .. } | BodyMode::Pending => Err(ResponseError::ModeConflict),
        }
    }

    /// Append a byte slice to the buffered body.
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<(), ResponseError> {
        self.send(Bytes::copy_from_slice(data))
    }

    /// Queue one chunk of a chunked body.
    ///
    /// Queued chunks are held until [`finish`](Self::finish) and then written
    /// first, ahead of any [`stream`](Self::stream) tail.
    pub fn send_chunk(&mut self, data: impl Into<Bytes>) -> Result<(), ResponseError> {
        let queued = self.chunked()?;
        let data = data.into();
        if !data.is_empty() {
            queued.push(data);
        }
        Ok(())
    }

    /// End a chunked body. Later chunk writes fail with
    /// [`ResponseError::AlreadySent`].
    pub fn send_final_chunk(&mut self) -> Result<(), ResponseError> {
        self.chunked()?;
        if let BodyMode::Chunked { closed, .. } = &mut self.mode {
            *closed = true;
        }
        Ok(())
    }

    /// Finish a chunked body with a stream of frames.
    pub fn stream(
        &mut self,
        stream: impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    ) -> Result<(), ResponseError> {
        self.chunked()?;
        if let BodyMode::Chunked { tail, closed, .. } = &mut self.mode {
            *tail = Some(Box::pin(stream));
            *closed = true;
        }
        Ok(())
    }

    /// Complete the response.
    ///
    /// `Date`, `Server`, `x-amz-date` and (when `host` is known) `Host` are
    /// added unless already set.
    #[must_use]
    pub fn finish(self, host: Option<&str>, server: &str) -> http::Response<S3ResponseBody> {
        let Self {
            status,
            mut headers,
            mode,
        } = self;

        let now = Utc::now();
        let defaults = [
            (header::DATE, Some(format_http_date(&now))),
            (header::SERVER, Some(server.to_owned())),
            (HeaderName::from_static("x-amz-date"), Some(now.format("%Y%m%dT%H%M%SZ").to_string())),
            (header::HOST, host.map(str::to_owned)),
        ];
        for (name, value) in defaults {
            let Some(value) = value else { continue };
            if headers.contains_key(&name) {
                continue;
            }
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }

        let body = match mode {
            BodyMode::Pending => S3ResponseBody::empty(),
            BodyMode::Buffered(buf) => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(buf.len()));
                S3ResponseBody::from_bytes(buf.freeze())
            }
            BodyMode::Chunked { queued, tail, .. } => {
                let head = futures::stream::iter(queued.into_iter().map(Ok));
                match tail {
                    Some(tail) => S3ResponseBody::from_stream(head.chain(tail)),
                    None => S3ResponseBody::from_stream(head),
                }
            }
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn ensure_open(&self) -> Result<(), ResponseError> {
        if self.is_started() {
            Err(ResponseError::HeadersFrozen)
        } else {
            Ok(())
        }
    }

    fn chunked(&mut self) -> Result<&mut Vec<Bytes>, ResponseError> {
        if matches!(self.mode, BodyMode::Pending) {
            self.mode = BodyMode::Chunked {
                queued: Vec::new(),
                tail: None,
                closed: false,
            };
        }
        match &mut self.mode {
            BodyMode::Chunked { closed: true, .. } => Err(ResponseError::AlreadySent),
            BodyMode::Chunked { queued, .. } => Ok(queued),
            BodyMode::Buffered(_) | BodyMode::Pending => Err(ResponseError::ModeConflict),
        }
    }
}

/// `Tue, 15 Nov 1994 08:12:31 GMT`
#[must_use]
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the XML error response for `err`.
///
/// `Resource` falls back to the request id when the error names none.
#[must_use]
pub fn error_response(err: &S3Error, request_id: &str) -> S3Response {
    let xml = s3gate_xml::error_to_xml(
        err.code.as_str(),
        &err.message,
        Some(err.resource.as_deref().unwrap_or(request_id)),
        request_id,
    );
    let mut response = S3Response::new();
    response.status = err.status_code;
    response.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/xml"),
    );
    response.mode = BodyMode::Buffered(BytesMut::from(xml.as_slice()));
    response
}

/// Convert an S3Error into a complete HTTP response with an XML error body.
#[must_use]
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    error_response(err, request_id).finish(None, DEFAULT_SERVER)
}
