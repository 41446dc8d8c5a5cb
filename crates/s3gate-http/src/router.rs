//! S3 request classification.
//!
//! The [`classify`] function maps a request onto exactly one [`S3Operation`]
//! by examining:
//!
//! - The HTTP method (GET, PUT, DELETE, POST, HEAD)
//! - Whether a bucket and a key were resolved
//! - Subresource query markers (e.g., `?acl`, `?tagging`, `?uploadId`)
//! - The `Range` header on object reads
//!
//! Markers take priority over the plain verb mapping. When several markers
//! are present the first row of [`RULES`] that fits wins, and the rows are in
//! byte order of the marker name, so `?acl&tagging` is an ACL request.

use http::{HeaderMap, Method};
use s3gate_model::{ByteRange, OperationTarget, S3Error, S3Operation};
use tracing::debug;

use crate::query::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Verb {
    fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::HEAD => Some(Self::Head),
            Method::PUT => Some(Self::Put),
            Method::POST => Some(Self::Post),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Rule {
    marker: &'static str,
    verb: Verb,
    target: OperationTarget,
    operation: S3Operation,
}

const fn rule(
    marker: &'static str,
    verb: Verb,
    target: OperationTarget,
    operation: S3Operation,
) -> Rule {
    Rule {
        marker,
        verb,
        target,
        operation,
    }
}

use OperationTarget::{Bucket as B, Object as O};
use S3Operation as Op;
use Verb::{Delete as DEL, Get as GET, Post as POST, Put as PUT};

/// Subresource rules, sorted by marker.
static RULES: &[Rule] = &[
    rule("acl", GET, B, Op::BucketReadAcl),
    rule("acl", PUT, B, Op::BucketWriteAcl),
    rule("acl", GET, O, Op::ObjectReadAcl),
    rule("acl", PUT, O, Op::ObjectWriteAcl),
    rule("delete", POST, B, Op::ObjectDeleteMultiple),
    rule("delete", DEL, B, Op::ObjectDeleteMultiple),
    rule("legal-hold", GET, O, Op::ObjectReadLegalHold),
    rule("legal-hold", PUT, O, Op::ObjectWriteLegalHold),
    rule("location", GET, B, Op::BucketReadLocation),
    rule("logging", GET, B, Op::BucketReadLogging),
    rule("logging", PUT, B, Op::BucketWriteLogging),
    rule("retention", GET, O, Op::ObjectReadRetention),
    rule("retention", PUT, O, Op::ObjectWriteRetention),
    rule("tagging", GET, B, Op::BucketReadTagging),
    rule("tagging", PUT, B, Op::BucketWriteTagging),
    rule("tagging", DEL, B, Op::BucketDeleteTagging),
    rule("tagging", GET, O, Op::ObjectReadTagging),
    rule("tagging", PUT, O, Op::ObjectWriteTagging),
    rule("tagging", DEL, O, Op::ObjectDeleteTagging),
    rule("uploadId", PUT, O, Op::ObjectUploadPart),
    rule("uploadId", POST, O, Op::ObjectCompleteMultipartUpload),
    rule("uploadId", DEL, O, Op::ObjectAbortMultipartUpload),
    rule("uploadId", GET, O, Op::ObjectListParts),
    rule("uploads", GET, B, Op::BucketListMultipartUploads),
    rule("uploads", POST, O, Op::ObjectCreateMultipartUpload),
    rule("versioning", GET, B, Op::BucketReadVersioning),
    rule("versioning", PUT, B, Op::BucketWriteVersioning),
    rule("versions", GET, B, Op::BucketReadVersions),
    rule("website", GET, B, Op::BucketReadWebsite),
    rule("website", PUT, B, Op::BucketWriteWebsite),
    rule("website", DEL, B, Op::BucketDeleteWebsite),
];

/// The outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The operation the request represents.
    pub operation: S3Operation,
    /// The parsed `Range` header of an [`S3Operation::ObjectReadRange`].
    pub range: Option<ByteRange>,
}

/// Classify a request.
///
/// Pure: the same inputs always give the same operation. Requests that fit
/// no rule are [`S3Operation::Unclassified`].
///
/// # Errors
///
/// Returns `InvalidRequest` when an object read carries a malformed `Range`
/// header.
pub fn classify(
    method: &Method,
    has_bucket: bool,
    has_key: bool,
    query: &QueryParams,
    headers: &HeaderMap,
) -> Result<Classification, S3Error> {
    let target = if has_key {
        OperationTarget::Object
    } else if has_bucket {
        OperationTarget::Bucket
    } else {
        OperationTarget::Service
    };

    let Some(verb) = Verb::from_method(method) else {
        return Ok(unclassified());
    };

    if let Some(rule) = RULES
        .iter()
        .find(|r| r.verb == verb && r.target == target && query.contains(r.marker))
    {
        debug!(marker = rule.marker, operation = %rule.operation, "classified by subresource");
        return Ok(Classification {
            operation: rule.operation,
            range: None,
        });
    }

    let operation = match (target, verb) {
        (OperationTarget::Service, Verb::Head) => Op::ServiceExists,
        (OperationTarget::Service, Verb::Get) => Op::ListBuckets,
        (OperationTarget::Bucket, Verb::Put) => Op::BucketCreate,
        (OperationTarget::Bucket, Verb::Delete) => Op::BucketDelete,
        (OperationTarget::Bucket, Verb::Head) => Op::BucketExists,
        (OperationTarget::Bucket, Verb::Get) => Op::BucketRead,
        (OperationTarget::Object, Verb::Put) => Op::ObjectCreate,
        (OperationTarget::Object, Verb::Delete) => Op::ObjectDelete,
        (OperationTarget::Object, Verb::Head) => Op::ObjectExists,
        (OperationTarget::Object, Verb::Get) => {
            if let Some(raw) = headers.get(http::header::RANGE) {
                let raw = raw
                    .to_str()
                    .map_err(|_| S3Error::invalid_request("Range header is not valid ASCII"))?;
                let range = ByteRange::parse(raw)?;
                return Ok(Classification {
                    operation: Op::ObjectReadRange,
                    range: Some(range),
                });
            }
            Op::ObjectRead
        }
        _ => return Ok(unclassified()),
    };

    Ok(Classification {
        operation,
        range: None,
    })
}

fn unclassified() -> Classification {
    Classification {
        operation: Op::Unclassified,
        range: None,
    }
}
