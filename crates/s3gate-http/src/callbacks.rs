//! Operation handler registries.
//!
//! Every operation kind has one optional [`Handler`] field in
//! [`ServiceCallbacks`], [`BucketCallbacks`] or [`ObjectCallbacks`]. A
//! handler receives the request context and, for writes with an XML body,
//! the decoded document. Registries are built once and shared behind an
//! `Arc` by every request.
//!
//! ```rust
//! use futures::FutureExt;
//! use s3gate_http::callbacks::{Handler, S3Callbacks};
//! use s3gate_model::types::{ListAllMyBucketsResult, Owner};
//!
//! let mut callbacks = S3Callbacks::default();
//! callbacks.service.list_buckets = Some(Handler::new(|_ctx, ()| {
//!     async move {
//!         Ok(ListAllMyBucketsResult {
//!             owner: Some(Owner::default()),
//!             buckets: Vec::new(),
//!         })
//!     }
//!     .boxed()
//! }));
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use http::StatusCode;
use s3gate_model::types::{
    AccessControlPolicy, BucketLocation, BucketLoggingStatus, CompleteMultipartUploadResult,
    CompletedMultipartUpload, CreateBucketConfiguration, Delete, DeleteResult,
    InitiateMultipartUploadResult, ListAllMyBucketsResult, ListBucketResult,
    ListMultipartUploadsResult, ListPartsResult, ListVersionsResult, ObjectLockLegalHold,
    ObjectLockRetention, Tagging, VersioningConfiguration, WebsiteConfiguration,
};
use s3gate_model::{ByteRange, GetObjectOutput, ObjectInfo, PutObjectOutput, S3Error, S3Operation};

use crate::context::S3Context;

/// Future returned by a handler.
pub type HandlerFuture<'a, O> = BoxFuture<'a, Result<O, S3Error>>;

type HandlerFn<I, O> = dyn for<'a> Fn(&'a mut S3Context, I) -> HandlerFuture<'a, O> + Send + Sync;

/// An async operation handler taking the context and an input `I`.
pub struct Handler<I, O> {
    f: Arc<HandlerFn<I, O>>,
}

impl<I, O> Handler<I, O> {
    /// Wrap a function returning a boxed future.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut S3Context, I) -> HandlerFuture<'a, O> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Invoke the handler.
    pub fn call<'a>(&self, ctx: &'a mut S3Context, input: I) -> HandlerFuture<'a, O> {
        (self.f)(ctx, input)
    }
}

impl<I, O> Clone for Handler<I, O> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<I, O> std::fmt::Debug for Handler<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Service-level handlers.
#[derive(Debug, Clone, Default)]
pub struct ServiceCallbacks {
    /// `HEAD /`.
    pub exists: Option<Handler<(), ()>>,
    /// `GET /`.
    pub list_buckets: Option<Handler<(), ListAllMyBucketsResult>>,
}

/// Bucket handlers.
#[derive(Debug, Clone, Default)]
pub struct BucketCallbacks {
    /// `PUT /bucket`, with the optional `CreateBucketConfiguration` body.
    pub create: Option<Handler<Option<CreateBucketConfiguration>, ()>>,
    /// `DELETE /bucket`.
    pub delete: Option<Handler<(), ()>>,
    /// `HEAD /bucket`.
    pub exists: Option<Handler<(), ()>>,
    /// `GET /bucket`. Listing parameters come from
    /// [`S3Request::list_params`](crate::context::S3Request::list_params).
    pub read: Option<Handler<(), ListBucketResult>>,
    /// `GET /bucket?acl`.
    pub read_acl: Option<Handler<(), AccessControlPolicy>>,
    /// `PUT /bucket?acl`.
    pub write_acl: Option<Handler<AccessControlPolicy, ()>>,
    /// `GET /bucket?location`.
    pub read_location: Option<Handler<(), BucketLocation>>,
    /// `GET /bucket?logging`.
    pub read_logging: Option<Handler<(), BucketLoggingStatus>>,
    /// `PUT /bucket?logging`.
    pub write_logging: Option<Handler<BucketLoggingStatus, ()>>,
    /// `GET /bucket?tagging`.
    pub read_tagging: Option<Handler<(), Tagging>>,
    /// `PUT /bucket?tagging`.
    pub write_tagging: Option<Handler<Tagging, ()>>,
    /// `DELETE /bucket?tagging`.
    pub delete_tagging: Option<Handler<(), ()>>,
    /// `GET /bucket?versioning`.
    pub read_versioning: Option<Handler<(), VersioningConfiguration>>,
    /// `PUT /bucket?versioning`.
    pub write_versioning: Option<Handler<VersioningConfiguration, ()>>,
    /// `GET /bucket?versions`.
    pub read_versions: Option<Handler<(), ListVersionsResult>>,
    /// `GET /bucket?website`.
    pub read_website: Option<Handler<(), WebsiteConfiguration>>,
    /// `PUT /bucket?website`.
    pub write_website: Option<Handler<WebsiteConfiguration, ()>>,
    /// `DELETE /bucket?website`.
    pub delete_website: Option<Handler<(), ()>>,
    /// `GET /bucket?uploads`.
    pub list_multipart_uploads: Option<Handler<(), ListMultipartUploadsResult>>,
}

/// Object handlers.
#[derive(Debug, Clone, Default)]
pub struct ObjectCallbacks {
    /// `PUT /bucket/key`. The handler reads the body from the context.
    pub create: Option<Handler<(), PutObjectOutput>>,
    /// `DELETE /bucket/key`.
    pub delete: Option<Handler<(), ()>>,
    /// `POST /bucket?delete`.
    pub delete_multiple: Option<Handler<Delete, DeleteResult>>,
    /// `HEAD /bucket/key`.
    pub exists: Option<Handler<(), ObjectInfo>>,
    /// `GET /bucket/key`.
    pub read: Option<Handler<(), GetObjectOutput>>,
    /// `GET /bucket/key` with a `Range` header.
    pub read_range: Option<Handler<ByteRange, GetObjectOutput>>,
    /// `GET /bucket/key?acl`.
    pub read_acl: Option<Handler<(), AccessControlPolicy>>,
    /// `PUT /bucket/key?acl`.
    pub write_acl: Option<Handler<AccessControlPolicy, ()>>,
    /// `GET /bucket/key?tagging`.
    pub read_tagging: Option<Handler<(), Tagging>>,
    /// `PUT /bucket/key?tagging`.
    pub write_tagging: Option<Handler<Tagging, ()>>,
    /// `DELETE /bucket/key?tagging`.
    pub delete_tagging: Option<Handler<(), ()>>,
    /// `GET /bucket/key?legal-hold`.
    pub read_legal_hold: Option<Handler<(), ObjectLockLegalHold>>,
    /// `PUT /bucket/key?legal-hold`.
    pub write_legal_hold: Option<Handler<ObjectLockLegalHold, ()>>,
    /// `GET /bucket/key?retention`.
    pub read_retention: Option<Handler<(), ObjectLockRetention>>,
    /// `PUT /bucket/key?retention`.
    pub write_retention: Option<Handler<ObjectLockRetention, ()>>,
    /// `POST /bucket/key?uploads`.
    pub create_multipart_upload: Option<Handler<(), InitiateMultipartUploadResult>>,
    /// `PUT /bucket/key?partNumber=N&uploadId=U`, with the part number.
    pub upload_part: Option<Handler<u32, PutObjectOutput>>,
    /// `POST /bucket/key?uploadId=U`.
    pub complete_multipart_upload:
        Option<Handler<CompletedMultipartUpload, CompleteMultipartUploadResult>>,
    /// `DELETE /bucket/key?uploadId=U`.
    pub abort_multipart_upload: Option<Handler<(), ()>>,
    /// `GET /bucket/key?uploadId=U`.
    pub list_parts: Option<Handler<(), ListPartsResult>>,
}

/// What the pre-hook decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreHookOutcome {
    /// Run the rest of the pipeline.
    Continue,
    /// Send the response the hook wrote to the context as is.
    Respond,
}

/// Summary given to the post-hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The classified operation.
    pub operation: S3Operation,
    /// Status of the response that was sent.
    pub status: StatusCode,
    /// Error code, when the request failed.
    pub error_code: Option<String>,
    /// Time from receipt to response.
    pub elapsed: Duration,
}

/// Everything the pipeline calls out to.
#[derive(Debug, Clone, Default)]
pub struct S3Callbacks {
    /// Service-level handlers.
    pub service: ServiceCallbacks,
    /// Bucket handlers.
    pub bucket: BucketCallbacks,
    /// Object handlers.
    pub object: ObjectCallbacks,
    /// Runs before authentication; may answer the request itself.
    pub pre_hook: Option<Handler<(), PreHookOutcome>>,
    /// Runs once after every response.
    pub post_hook: Option<Handler<Completion, ()>>,
    /// Runs for unclassified requests and operations without a handler. It
    /// writes the response into the context.
    pub default_handler: Option<Handler<(), ()>>,
}
