//! Per-request state handed to handlers.
//!
//! An [`S3Context`] owns one [`S3Request`] and one [`S3Response`]. It is built
//! when a request arrives and dropped when the response has been produced;
//! nothing in it is shared with other requests.

use std::any::Any;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method, Uri};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use s3gate_auth::{AuthResult, RequestSignature, SignatureVersion};
use s3gate_model::{ByteRange, S3Error, S3ErrorCode, S3Operation};
use tracing::debug;
use uuid::Uuid;

use crate::address::{self, BaseDomainMatcher, ResolvedAddress};
use crate::chunked::{self, ChunkDecoder};
use crate::query::QueryParams;
use crate::response::S3Response;
use crate::router;

/// Boxed error of a transport body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_MAX_KEYS: u32 = 1000;

enum BodyState {
    Stream(UnsyncBoxBody<Bytes, BoxError>),
    Buffered(Bytes),
    Taken,
}

/// The request body.
///
/// Starts as the transport stream. [`buffer`](Self::buffer) reads it into
/// memory once and keeps the bytes, so the authenticator and a handler can
/// both see the same payload.
pub struct RequestBody {
    state: BodyState,
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            BodyState::Stream(_) => f.write_str("RequestBody::Stream"),
            BodyState::Buffered(b) => write!(f, "RequestBody::Buffered({})", b.len()),
            BodyState::Taken => f.write_str("RequestBody::Taken"),
        }
    }
}

impl RequestBody {
    /// Wrap a transport body.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            state: BodyState::Stream(body.map_err(Into::into).boxed_unsync()),
        }
    }

    /// An already buffered body.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            state: BodyState::Buffered(data.into()),
        }
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// True once the body has been read into memory.
    #[must_use]
    pub fn is_buffered(&self) -> bool {
        matches!(self.state, BodyState::Buffered(_))
    }

    /// Read the whole body into memory, keeping a copy for later readers.
    ///
    /// # Errors
    ///
    /// `IncompleteBody` when the transport fails, `InternalError` when the
    /// body was already handed off as a stream.
    pub async fn buffer(&mut self) -> Result<Bytes, S3Error> {
        match std::mem::replace(&mut self.state, BodyState::Taken) {
            BodyState::Stream(stream) => {
                let data = stream
                    .collect()
                    .await
                    .map_err(|e| {
                        debug!(error = %e, "failed to read request body");
                        S3Error::with_message(S3ErrorCode::IncompleteBody, e.to_string())
                    })?
                    .to_bytes();
                self.state = BodyState::Buffered(data.clone());
                Ok(data)
            }
            BodyState::Buffered(data) => {
                self.state = BodyState::Buffered(data.clone());
                Ok(data)
            }
            BodyState::Taken => Err(S3Error::internal_error(
                "request body was already consumed",
            )),
        }
    }

    /// Move the body out, leaving a consumed marker behind.
    pub fn take(&mut self) -> Self {
        Self {
            state: std::mem::replace(&mut self.state, BodyState::Taken),
        }
    }
}

impl Body for RequestBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match &mut this.state {
            BodyState::Stream(stream) => Pin::new(stream).poll_frame(cx),
            BodyState::Buffered(data) => {
                let data = std::mem::take(data);
                this.state = BodyState::Taken;
                if data.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Frame::data(data))))
                }
            }
            BodyState::Taken => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.state {
            BodyState::Stream(stream) => stream.is_end_stream(),
            BodyState::Buffered(data) => data.is_empty(),
            BodyState::Taken => true,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.state {
            BodyState::Stream(stream) => stream.size_hint(),
            BodyState::Buffered(data) => SizeHint::with_exact(data.len() as u64),
            BodyState::Taken => SizeHint::with_exact(0),
        }
    }
}

/// `list-type` of a bucket listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    /// Marker-based listing.
    #[default]
    V1,
    /// Continuation-token listing (`list-type=2`).
    V2,
}

/// Listing parameters from the query string of a bucket read, versions
/// listing or multipart uploads listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// `list-type`.
    pub list_type: ListType,
    /// `prefix`.
    pub prefix: Option<String>,
    /// `delimiter`.
    pub delimiter: Option<String>,
    /// `marker` (v1).
    pub marker: Option<String>,
    /// `max-keys` (or `max-uploads`), 1000 when absent.
    pub max_keys: u32,
    /// `continuation-token` (v2).
    pub continuation_token: Option<String>,
    /// `start-after` (v2).
    pub start_after: Option<String>,
    /// `encoding-type`.
    pub encoding_type: Option<String>,
    /// `key-marker` (versions and uploads).
    pub key_marker: Option<String>,
    /// `version-id-marker` (versions).
    pub version_id_marker: Option<String>,
    /// `upload-id-marker` (uploads).
    pub upload_id_marker: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            list_type: ListType::V1,
            prefix: None,
            delimiter: None,
            marker: None,
            max_keys: DEFAULT_MAX_KEYS,
            continuation_token: None,
            start_after: None,
            encoding_type: None,
            key_marker: None,
            version_id_marker: None,
            upload_id_marker: None,
        }
    }
}

/// The inbound request.
pub struct S3Request {
    /// HTTP method.
    pub method: Method,
    /// Request target.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Decoded query parameters.
    pub query: QueryParams,
    /// Resolved bucket and key.
    pub address: ResolvedAddress,
    /// Region from the credential scope, the host, or the default.
    pub region: String,
    /// Detected signature.
    pub signature: RequestSignature,
    operation: S3Operation,
    /// Parsed `Range` header of a range read.
    pub range: Option<ByteRange>,
    /// Payload length: `x-amz-decoded-content-length` for chunked uploads,
    /// `Content-Length` otherwise.
    pub content_length: Option<u64>,
    /// True when the body uses aws-chunked framing.
    pub chunked: bool,
    /// The body.
    pub body: RequestBody,
    /// Set after successful signature verification.
    pub auth: Option<AuthResult>,
}

impl std::fmt::Debug for S3Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("operation", &self.operation)
            .field("bucket", &self.address.bucket)
            .field("key", &self.address.key)
            .field("region", &self.region)
            .field("range", &self.range)
            .field("chunked", &self.chunked)
            .finish_non_exhaustive()
    }
}

impl S3Request {
    /// The operation, fixed when the request was classified.
    #[must_use]
    pub fn operation(&self) -> S3Operation {
        self.operation
    }

    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.address.bucket.as_deref()
    }

    /// Object key.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.address.key.as_deref()
    }

    /// Access key that signed the request.
    #[must_use]
    pub fn access_key_id(&self) -> Option<&str> {
        self.signature.access_key_id()
    }

    /// Signature version.
    #[must_use]
    pub fn signature_version(&self) -> SignatureVersion {
        self.signature.version()
    }

    /// A header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// `uploadId` query parameter.
    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        self.query.get("uploadId")
    }

    /// `versionId` query parameter.
    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        self.query.get("versionId")
    }

    /// `partNumber` query parameter.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the value is not a number from 1 to 10000.
    pub fn part_number(&self) -> Result<Option<u32>, S3Error> {
        let Some(raw) = self.query.get("partNumber") else {
            return Ok(None);
        };
        match raw.parse::<u32>() {
            Ok(n) if (1..=10_000).contains(&n) => Ok(Some(n)),
            _ => Err(S3Error::invalid_argument(format!(
                "Part number must be an integer between 1 and 10000, got {raw}"
            ))),
        }
    }

    /// User metadata from `x-amz-meta-*` headers, prefix removed.
    #[must_use]
    pub fn user_metadata(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .filter_map(|(name, value)| {
                let key = name.as_str().strip_prefix("x-amz-meta-")?;
                Some((key.to_owned(), value.to_str().ok()?.to_owned()))
            })
            .collect()
    }

    /// Listing parameters.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a non-numeric `max-keys` or an unknown
    /// `list-type`.
    pub fn list_params(&self) -> Result<ListParams, S3Error> {
        let owned = |key: &str| self.query.get(key).map(str::to_owned);
        let list_type = match self.query.get("list-type") {
            None | Some("1") => ListType::V1,
            Some("2") => ListType::V2,
            Some(other) => {
                return Err(S3Error::invalid_argument(format!("Invalid list-type: {other}")));
            }
        };
        let max_keys = match self.query.get("max-keys").or_else(|| self.query.get("max-uploads")) {
            None => DEFAULT_MAX_KEYS,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| S3Error::invalid_argument(format!("Invalid max-keys: {raw}")))?,
        };
        Ok(ListParams {
            list_type,
            prefix: owned("prefix"),
            delimiter: owned("delimiter"),
            marker: owned("marker"),
            max_keys,
            continuation_token: owned("continuation-token"),
            start_after: owned("start-after"),
            encoding_type: owned("encoding-type"),
            key_marker: owned("key-marker"),
            version_id_marker: owned("version-id-marker"),
            upload_id_marker: owned("upload-id-marker"),
        })
    }

    /// The whole payload, aws-chunked framing removed.
    ///
    /// The body stays buffered, so this can be called more than once.
    pub async fn payload(&mut self) -> Result<Bytes, S3Error> {
        let raw = self.body.buffer().await?;
        if self.chunked {
            Ok(chunked::decode_aws_chunked(&raw)?)
        } else {
            Ok(raw)
        }
    }

    /// Read the payload chunk by chunk. Takes the body.
    pub fn chunks(&mut self) -> ChunkDecoder<RequestBody> {
        ChunkDecoder::new(self.body.take(), self.chunked)
    }
}

/// Per-request aggregate of request, response and user data.
pub struct S3Context {
    /// The request.
    pub request: S3Request,
    /// The response under construction.
    pub response: S3Response,
    metadata: Option<Arc<dyn Any + Send + Sync>>,
    /// When the request arrived.
    pub received_at: DateTime<Utc>,
    /// Value of `x-amz-request-id`.
    pub request_id: String,
    /// Value of `x-amz-id-2`.
    pub trace_id: String,
}

impl std::fmt::Debug for S3Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Context")
            .field("request_id", &self.request_id)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("has_metadata", &self.metadata.is_some())
            .finish_non_exhaustive()
    }
}

impl S3Context {
    /// Attach user data, replacing any previous value.
    pub fn set_metadata(&mut self, metadata: Arc<dyn Any + Send + Sync>) {
        self.metadata = Some(metadata);
    }

    /// The attached user data, if it is a `T`.
    #[must_use]
    pub fn metadata<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.metadata.as_deref()?.downcast_ref::<T>()
    }

    /// The attached user data as stored.
    #[must_use]
    pub fn raw_metadata(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.metadata.as_ref()
    }
}

/// Inputs for building a context besides the request itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContextOptions<'a> {
    pub force_path_style: bool,
    pub default_region: &'a str,
    pub matcher: Option<&'a dyn BaseDomainMatcher>,
}

/// Build the context of an inbound request.
///
/// Addressing and classification failures do not abort construction: the
/// request is recorded as [`S3Operation::Unclassified`] and the error is
/// returned alongside so the pipeline can report it after its hooks ran.
pub(crate) fn build_context(
    parts: http::request::Parts,
    body: RequestBody,
    options: ContextOptions<'_>,
) -> (S3Context, Option<S3Error>) {
    let http::request::Parts {
        method,
        uri,
        headers,
        ..
    } = parts;

    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| uri.authority().map(|a| a.as_str().to_owned()))
        .unwrap_or_default();

    let mut deferred: Option<S3Error> = None;
    let address = address::resolve(&host, uri.path(), options.force_path_style, options.matcher)
        .unwrap_or_else(|err| {
            deferred = Some(err.into());
            ResolvedAddress::default()
        });

    let query = QueryParams::parse(uri.query().unwrap_or_default());
    let (operation, range) = if deferred.is_some() {
        (S3Operation::Unclassified, None)
    } else {
        match router::classify(
            &method,
            address.bucket.is_some(),
            address.key.is_some(),
            &query,
            &headers,
        ) {
            Ok(c) => (c.operation, c.range),
            Err(err) => {
                deferred = Some(err);
                (S3Operation::Unclassified, None)
            }
        }
    };

    let signature = RequestSignature::detect(&headers, uri.query());
    let region = address::resolve_region(signature.region(), &host, options.default_region);
    let chunked = chunked::is_aws_chunked(&headers);
    let length_header = if chunked {
        "x-amz-decoded-content-length"
    } else {
        http::header::CONTENT_LENGTH.as_str()
    };
    let content_length = headers
        .get(length_header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let request = S3Request {
        method,
        uri,
        headers,
        query,
        address,
        region,
        signature,
        operation,
        range,
        content_length,
        chunked,
        body,
        auth: None,
    };

    let context = S3Context {
        request,
        response: S3Response::new(),
        metadata: None,
        received_at: Utc::now(),
        request_id: new_request_id(),
        trace_id: new_trace_id(),
    };
    (context, deferred)
}

fn new_request_id() -> String {
    format!("{:016X}", Uuid::new_v4().as_u64_pair().0)
}

fn new_trace_id() -> String {
    let mut raw = [0u8; 48];
    for chunk in raw.chunks_mut(16) {
        chunk.copy_from_slice(Uuid::new_v4().as_bytes());
    }
    BASE64.encode(raw)
}

#[cfg(test)]
pub(crate) mod tests {
    use http_body_util::Full;

    use super::*;
    use crate::address::StaticBaseDomains;

    pub(crate) fn context_for(request: http::Request<Bytes>) -> (S3Context, Option<S3Error>) {
        let (parts, body) = request.into_parts();
        build_context(
            parts,
            RequestBody::new(Full::new(body)),
            ContextOptions {
                force_path_style: true,
                default_region: "us-east-1",
                matcher: None,
            },
        )
    }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri)
            .header("host", "localhost:4566")
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn test_should_build_context_for_object_read() {
        let (ctx, err) = context_for(get("/default/hello.txt?versionId=v1"));
        assert!(err.is_none());
        assert_eq!(ctx.request.operation(), S3Operation::ObjectRead);
        assert_eq!(ctx.request.bucket(), Some("default"));
        assert_eq!(ctx.request.key(), Some("hello.txt"));
        assert_eq!(ctx.request.version_id(), Some("v1"));
        assert_eq!(ctx.request.region, "us-east-1");
        assert_eq!(ctx.request_id.len(), 16);
        assert!(!ctx.trace_id.is_empty());
    }

    #[test]
    fn test_should_defer_addressing_errors() {
        let (parts, _) = get("/").into_parts();
        let domains = StaticBaseDomains::new(["s3.example.com"]);
        let (ctx, err) = build_context(
            parts,
            RequestBody::empty(),
            ContextOptions {
                force_path_style: false,
                default_region: "us-east-1",
                matcher: Some(&domains),
            },
        );
        assert_eq!(ctx.request.operation(), S3Operation::Unclassified);
        assert_eq!(err.map(|e| e.code), Some(S3ErrorCode::InvalidRequest));
    }

    #[test]
    fn test_should_defer_malformed_range() {
        let request = http::Request::get("/b/k")
            .header("range", "bytes=9-1")
            .body(Bytes::new())
            .unwrap();
        let (ctx, err) = context_for(request);
        assert_eq!(ctx.request.operation(), S3Operation::Unclassified);
        assert_eq!(err.map(|e| e.code), Some(S3ErrorCode::InvalidRequest));
    }

    #[test]
    fn test_should_extract_user_metadata_and_part_number() {
        let request = http::Request::put("/b/k?partNumber=3&uploadId=abc")
            .header("x-amz-meta-Color", "blue")
            .header("x-amz-meta-size", "L")
            .header("content-type", "text/plain")
            .body(Bytes::new())
            .unwrap();
        let (ctx, _) = context_for(request);
        let meta = ctx.request.user_metadata();
        assert_eq!(meta.get("color").map(String::as_str), Some("blue"));
        assert_eq!(meta.len(), 2);
        assert_eq!(ctx.request.part_number().unwrap(), Some(3));
        assert_eq!(ctx.request.upload_id(), Some("abc"));
        assert_eq!(ctx.request.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_should_reject_out_of_range_part_number() {
        let (ctx, _) = context_for(get("/b/k?partNumber=0&uploadId=abc"));
        assert!(ctx.request.part_number().is_err());
    }

    #[test]
    fn test_should_parse_list_params() {
        let (ctx, _) = context_for(get("/b?list-type=2&prefix=photos%2F&delimiter=%2F&max-keys=50"));
        let params = ctx.request.list_params().unwrap();
        assert_eq!(params.list_type, ListType::V2);
        assert_eq!(params.prefix.as_deref(), Some("photos/"));
        assert_eq!(params.delimiter.as_deref(), Some("/"));
        assert_eq!(params.max_keys, 50);

        let (ctx, _) = context_for(get("/b"));
        assert_eq!(ctx.request.list_params().unwrap().max_keys, 1000);

        let (ctx, _) = context_for(get("/b?max-keys=many"));
        assert!(ctx.request.list_params().is_err());
    }

    #[tokio::test]
    async fn test_should_keep_buffered_payload_for_later_reads() {
        let request = http::Request::put("/b/k").body(Bytes::from("payload")).unwrap();
        let (mut ctx, _) = context_for(request);
        assert_eq!(ctx.request.payload().await.unwrap().as_ref(), b"payload");
        assert!(ctx.request.body.is_buffered());
        assert_eq!(ctx.request.payload().await.unwrap().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_should_decode_chunked_payload() {
        let request = http::Request::put("/b/k")
            .header("x-amz-content-sha256", "STREAMING-UNSIGNED-PAYLOAD-TRAILER")
            .header("x-amz-decoded-content-length", "3")
            .body(Bytes::from("3\r\nabc\r\n0\r\n\r\n"))
            .unwrap();
        let (mut ctx, _) = context_for(request);
        assert!(ctx.request.chunked);
        assert_eq!(ctx.request.content_length, Some(3));
        assert_eq!(ctx.request.payload().await.unwrap().as_ref(), b"abc");
    }

    #[tokio::test]
    async fn test_should_stream_chunks_once() {
        let request = http::Request::put("/b/k").body(Bytes::from("data")).unwrap();
        let (mut ctx, _) = context_for(request);
        let body = ctx.request.chunks().collect().await.unwrap();
        assert_eq!(body.as_ref(), b"data");
        assert!(ctx.request.payload().await.is_err());
    }

    #[test]
    fn test_should_downcast_metadata() {
        let (mut ctx, _) = context_for(get("/"));
        assert!(ctx.metadata::<String>().is_none());
        ctx.set_metadata(Arc::new("tenant-a".to_owned()));
        assert_eq!(ctx.metadata::<String>().map(String::as_str), Some("tenant-a"));
        assert!(ctx.metadata::<u32>().is_none());
    }
}
