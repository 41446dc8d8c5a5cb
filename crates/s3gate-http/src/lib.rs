//! S3 request classification, addressing, chunked bodies, dispatch, and hyper
//! service.
//!
//! This crate is the HTTP side of the s3gate protocol engine:
//!
//! - **Addressing** ([`address`]): path-style and virtual-hosted bucket/key
//!   resolution against a set of base domains, and region resolution.
//! - **Classification** ([`router`]): maps method, addressing and query
//!   markers to an [`S3Operation`](s3gate_model::S3Operation).
//! - **Chunked bodies** ([`chunked`]): `aws-chunked` payload decoding.
//! - **Context** ([`context`]): the per-request [`S3Context`] handed to
//!   handlers.
//! - **Response writer** ([`response`]): buffered and chunked response
//!   building.
//! - **Callbacks** ([`callbacks`]): the handler registries.
//! - **Dispatch** ([`dispatch`]): runs handlers and writes their results.
//! - **Service** ([`service`]): [`S3HttpService`], a hyper `Service` tying it
//!   all together.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> S3HttpService (hyper Service)
//!     -> Health check interception
//!     -> S3Context (addressing, classification)
//!     -> Common response headers
//!     -> Pre-hook
//!     -> SigV4 authentication (optional)
//!     -> dispatch (S3Callbacks)
//!     -> Post-hook
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use s3gate_http::callbacks::S3Callbacks;
//! use s3gate_http::service::{S3HttpConfig, S3HttpService};
//!
//! let service = S3HttpService::new(S3Callbacks::default(), S3HttpConfig::default());
//! // Use `service` with a hyper server.
//! ```

// S3Error is the protocol error carried by every handler Result. Boxing it in
// each Result would add an allocation to every failing request for no gain.
#![allow(clippy::result_large_err)]

pub mod address;
pub mod body;
pub mod callbacks;
pub mod chunked;
pub mod context;
pub mod dispatch;
pub mod query;
pub mod response;
pub mod router;
pub mod service;

pub use address::{AddressingStyle, BaseDomainMatcher, ResolvedAddress, StaticBaseDomains};
pub use body::S3ResponseBody;
pub use callbacks::{Completion, Handler, PreHookOutcome, S3Callbacks};
pub use chunked::{Chunk, ChunkDecoder, ChunkError};
pub use context::{ListParams, ListType, RequestBody, S3Context, S3Request};
pub use response::{ResponseError, S3Response, error_to_response};
pub use service::{
    LookupRequest, PipelineStage, ProviderLookup, S3HttpConfig, S3HttpService, SecretKeyLookup,
};
