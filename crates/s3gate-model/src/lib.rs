//! Operation kinds, error codes, and wire types for the s3gate S3 protocol
//! engine.
//!
//! Everything here is transport-agnostic: the HTTP crate classifies requests
//! into [`S3Operation`] values, handlers exchange the documents in [`types`],
//! and every failure is an [`S3Error`].

pub mod error;
pub mod operations;
pub mod output;
pub mod range;
pub mod types;

pub use error::{S3Error, S3ErrorCode};
pub use operations::{Addressing, OperationTarget, S3Operation};
pub use output::{GetObjectOutput, ObjectInfo, PutObjectOutput, StreamingBlob};
pub use range::{ByteRange, RangeError, ResolvedRange};
