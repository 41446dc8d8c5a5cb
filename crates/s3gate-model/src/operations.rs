//! The closed set of S3 operation kinds recognized by the request classifier.

use serde::{Deserialize, Serialize};

/// Which callback registry handles an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationTarget {
    /// Service-level operations (no bucket).
    Service,
    /// Operations on a bucket or its subresources.
    Bucket,
    /// Operations on an object or its subresources.
    Object,
}

/// The addressing an operation requires from the resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// Neither bucket nor key may be present.
    None,
    /// A bucket is required; a key must be absent.
    Bucket,
    /// Both bucket and key are required.
    BucketAndKey,
    /// No requirement (used by [`S3Operation::Unclassified`]).
    Any,
}

/// Every operation kind the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum S3Operation {
    /// `HEAD /`
    ServiceExists,
    /// `GET /`
    ListBuckets,

    /// `PUT /bucket`
    BucketCreate,
    /// `DELETE /bucket`
    BucketDelete,
    /// `HEAD /bucket`
    BucketExists,
    /// `GET /bucket` (list objects)
    BucketRead,
    /// `GET /bucket?acl`
    BucketReadAcl,
    /// `PUT /bucket?acl`
    BucketWriteAcl,
    /// `GET /bucket?location`
    BucketReadLocation,
    /// `GET /bucket?logging`
    BucketReadLogging,
    /// `PUT /bucket?logging`
    BucketWriteLogging,
    /// `GET /bucket?tagging`
    BucketReadTagging,
    /// `PUT /bucket?tagging`
    BucketWriteTagging,
    /// `DELETE /bucket?tagging`
    BucketDeleteTagging,
    /// `GET /bucket?versioning`
    BucketReadVersioning,
    /// `PUT /bucket?versioning`
    BucketWriteVersioning,
    /// `GET /bucket?versions`
    BucketReadVersions,
    /// `GET /bucket?website`
    BucketReadWebsite,
    /// `PUT /bucket?website`
    BucketWriteWebsite,
    /// `DELETE /bucket?website`
    BucketDeleteWebsite,
    /// `GET /bucket?uploads`
    BucketListMultipartUploads,

    /// `PUT /bucket/key`
    ObjectCreate,
    /// `DELETE /bucket/key`
    ObjectDelete,
    /// `POST /bucket?delete`
    ObjectDeleteMultiple,
    /// `HEAD /bucket/key`
    ObjectExists,
    /// `GET /bucket/key`
    ObjectRead,
    /// `GET /bucket/key` with a `Range` header
    ObjectReadRange,
    /// `GET /bucket/key?acl`
    ObjectReadAcl,
    /// `PUT /bucket/key?acl`
    ObjectWriteAcl,
    /// `GET /bucket/key?tagging`
    ObjectReadTagging,
    /// `PUT /bucket/key?tagging`
    ObjectWriteTagging,
    /// `DELETE /bucket/key?tagging`
    ObjectDeleteTagging,
    /// `GET /bucket/key?legal-hold`
    ObjectReadLegalHold,
    /// `PUT /bucket/key?legal-hold`
    ObjectWriteLegalHold,
    /// `GET /bucket/key?retention`
    ObjectReadRetention,
    /// `PUT /bucket/key?retention`
    ObjectWriteRetention,
    /// `POST /bucket/key?uploads`
    ObjectCreateMultipartUpload,
    /// `PUT /bucket/key?uploadId=..&partNumber=..`
    ObjectUploadPart,
    /// `POST /bucket/key?uploadId=..`
    ObjectCompleteMultipartUpload,
    /// `DELETE /bucket/key?uploadId=..`
    ObjectAbortMultipartUpload,
    /// `GET /bucket/key?uploadId=..`
    ObjectListParts,

    /// No classification rule matched.
    Unclassified,
}

impl S3Operation {
    /// All operation kinds, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::ServiceExists,
        Self::ListBuckets,
        Self::BucketCreate,
        Self::BucketDelete,
        Self::BucketExists,
        Self::BucketRead,
        Self::BucketReadAcl,
        Self::BucketWriteAcl,
        Self::BucketReadLocation,
        Self::BucketReadLogging,
        Self::BucketWriteLogging,
        Self::BucketReadTagging,
        Self::BucketWriteTagging,
        Self::BucketDeleteTagging,
        Self::BucketReadVersioning,
        Self::BucketWriteVersioning,
        Self::BucketReadVersions,
        Self::BucketReadWebsite,
        Self::BucketWriteWebsite,
        Self::BucketDeleteWebsite,
        Self::BucketListMultipartUploads,
        Self::ObjectCreate,
        Self::ObjectDelete,
        Self::ObjectDeleteMultiple,
        Self::ObjectExists,
        Self::ObjectRead,
        Self::ObjectReadRange,
        Self::ObjectReadAcl,
        Self::ObjectWriteAcl,
        Self::ObjectReadTagging,
        Self::ObjectWriteTagging,
        Self::ObjectDeleteTagging,
        Self::ObjectReadLegalHold,
        Self::ObjectWriteLegalHold,
        Self::ObjectReadRetention,
        Self::ObjectWriteRetention,
        Self::ObjectCreateMultipartUpload,
        Self::ObjectUploadPart,
        Self::ObjectCompleteMultipartUpload,
        Self::ObjectAbortMultipartUpload,
        Self::ObjectListParts,
        Self::Unclassified,
    ];

    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceExists => "ServiceExists",
            Self::ListBuckets => "ListBuckets",
            Self::BucketCreate => "BucketCreate",
            Self::BucketDelete => "BucketDelete",
            Self::BucketExists => "BucketExists",
            Self::BucketRead => "BucketRead",
            Self::BucketReadAcl => "BucketReadAcl",
            Self::BucketWriteAcl => "BucketWriteAcl",
            Self::BucketReadLocation => "BucketReadLocation",
            Self::BucketReadLogging => "BucketReadLogging",
            Self::BucketWriteLogging => "BucketWriteLogging",
            Self::BucketReadTagging => "BucketReadTagging",
            Self::BucketWriteTagging => "BucketWriteTagging",
            Self::BucketDeleteTagging => "BucketDeleteTagging",
            Self::BucketReadVersioning => "BucketReadVersioning",
            Self::BucketWriteVersioning => "BucketWriteVersioning",
            Self::BucketReadVersions => "BucketReadVersions",
            Self::BucketReadWebsite => "BucketReadWebsite",
            Self::BucketWriteWebsite => "BucketWriteWebsite",
            Self::BucketDeleteWebsite => "BucketDeleteWebsite",
            Self::BucketListMultipartUploads => "BucketListMultipartUploads",
            Self::ObjectCreate => "ObjectCreate",
            Self::ObjectDelete => "ObjectDelete",
            Self::ObjectDeleteMultiple => "ObjectDeleteMultiple",
            Self::ObjectExists => "ObjectExists",
            Self::ObjectRead => "ObjectRead",
            Self::ObjectReadRange => "ObjectReadRange",
            Self::ObjectReadAcl => "ObjectReadAcl",
            Self::ObjectWriteAcl => "ObjectWriteAcl",
            Self::ObjectReadTagging => "ObjectReadTagging",
            Self::ObjectWriteTagging => "ObjectWriteTagging",
            Self::ObjectDeleteTagging => "ObjectDeleteTagging",
            Self::ObjectReadLegalHold => "ObjectReadLegalHold",
            Self::ObjectWriteLegalHold => "ObjectWriteLegalHold",
            Self::ObjectReadRetention => "ObjectReadRetention",
            Self::ObjectWriteRetention => "ObjectWriteRetention",
            Self::ObjectCreateMultipartUpload => "ObjectCreateMultipartUpload",
            Self::ObjectUploadPart => "ObjectUploadPart",
            Self::ObjectCompleteMultipartUpload => "ObjectCompleteMultipartUpload",
            Self::ObjectAbortMultipartUpload => "ObjectAbortMultipartUpload",
            Self::ObjectListParts => "ObjectListParts",
            Self::Unclassified => "Unclassified",
        }
    }

    /// Returns the name AWS uses for the equivalent API call.
    #[must_use]
    pub fn aws_name(&self) -> &'static str {
        match self {
            Self::ServiceExists => "HeadService",
            Self::ListBuckets => "ListBuckets",
            Self::BucketCreate => "CreateBucket",
            Self::BucketDelete => "DeleteBucket",
            Self::BucketExists => "HeadBucket",
            Self::BucketRead => "ListObjects",
            Self::BucketReadAcl => "GetBucketAcl",
            Self::BucketWriteAcl => "PutBucketAcl",
            Self::BucketReadLocation => "GetBucketLocation",
            Self::BucketReadLogging => "GetBucketLogging",
            Self::BucketWriteLogging => "PutBucketLogging",
            Self::BucketReadTagging => "GetBucketTagging",
            Self::BucketWriteTagging => "PutBucketTagging",
            Self::BucketDeleteTagging => "DeleteBucketTagging",
            Self::BucketReadVersioning => "GetBucketVersioning",
            Self::BucketWriteVersioning => "PutBucketVersioning",
            Self::BucketReadVersions => "ListObjectVersions",
            Self::BucketReadWebsite => "GetBucketWebsite",
            Self::BucketWriteWebsite => "PutBucketWebsite",
            Self::BucketDeleteWebsite => "DeleteBucketWebsite",
            Self::BucketListMultipartUploads => "ListMultipartUploads",
            Self::ObjectCreate => "PutObject",
            Self::ObjectDelete => "DeleteObject",
            Self::ObjectDeleteMultiple => "DeleteObjects",
            Self::ObjectExists => "HeadObject",
            Self::ObjectRead | Self::ObjectReadRange => "GetObject",
            Self::ObjectReadAcl => "GetObjectAcl",
            Self::ObjectWriteAcl => "PutObjectAcl",
            Self::ObjectReadTagging => "GetObjectTagging",
            Self::ObjectWriteTagging => "PutObjectTagging",
            Self::ObjectDeleteTagging => "DeleteObjectTagging",
            Self::ObjectReadLegalHold => "GetObjectLegalHold",
            Self::ObjectWriteLegalHold => "PutObjectLegalHold",
            Self::ObjectReadRetention => "GetObjectRetention",
            Self::ObjectWriteRetention => "PutObjectRetention",
            Self::ObjectCreateMultipartUpload => "CreateMultipartUpload",
            Self::ObjectUploadPart => "UploadPart",
            Self::ObjectCompleteMultipartUpload => "CompleteMultipartUpload",
            Self::ObjectAbortMultipartUpload => "AbortMultipartUpload",
            Self::ObjectListParts => "ListParts",
            Self::Unclassified => "Unknown",
        }
    }

    /// Look up an operation by its [`as_str`](Self::as_str) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == name)
    }

    /// Returns the registry that owns this operation, if any.
    #[must_use]
    pub fn target(&self) -> Option<OperationTarget> {
        match self {
            Self::ServiceExists | Self::ListBuckets => Some(OperationTarget::Service),
            Self::BucketCreate
            | Self::BucketDelete
            | Self::BucketExists
            | Self::BucketRead
            | Self::BucketReadAcl
            | Self::BucketWriteAcl
            | Self::BucketReadLocation
            | Self::BucketReadLogging
            | Self::BucketWriteLogging
            | Self::BucketReadTagging
            | Self::BucketWriteTagging
            | Self::BucketDeleteTagging
            | Self::BucketReadVersioning
            | Self::BucketWriteVersioning
            | Self::BucketReadVersions
            | Self::BucketReadWebsite
            | Self::BucketWriteWebsite
            | Self::BucketDeleteWebsite
            | Self::BucketListMultipartUploads => Some(OperationTarget::Bucket),
            Self::Unclassified => None,
            _ => Some(OperationTarget::Object),
        }
    }

    /// Returns the bucket/key presence this operation requires.
    ///
    /// Multi-object delete is an object operation addressed at a bucket.
    #[must_use]
    pub fn addressing(&self) -> Addressing {
        match self {
            Self::Unclassified => Addressing::Any,
            Self::ObjectDeleteMultiple => Addressing::Bucket,
            _ => match self.target() {
                Some(OperationTarget::Service) => Addressing::None,
                Some(OperationTarget::Bucket) => Addressing::Bucket,
                Some(OperationTarget::Object) => Addressing::BucketAndKey,
                None => Addressing::Any,
            },
        }
    }

    /// Returns true when the request's bucket/key presence satisfies
    /// [`addressing`](Self::addressing).
    #[must_use]
    pub fn accepts_addressing(&self, has_bucket: bool, has_key: bool) -> bool {
        match self.addressing() {
            Addressing::None => !has_bucket && !has_key,
            Addressing::Bucket => has_bucket && !has_key,
            Addressing::BucketAndKey => has_bucket && has_key,
            Addressing::Any => true,
        }
    }

    /// Returns true for operations whose success response is `204 No Content`.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Self::BucketDelete
                | Self::BucketDeleteTagging
                | Self::BucketDeleteWebsite
                | Self::ObjectDelete
                | Self::ObjectDeleteTagging
                | Self::ObjectAbortMultipartUpload
        )
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_every_operation_name() {
        for op in S3Operation::ALL {
            assert_eq!(S3Operation::from_name(op.as_str()), Some(*op));
        }
        assert_eq!(S3Operation::from_name("GetObject"), None);
    }

    #[test]
    fn test_should_assign_targets_by_prefix() {
        for op in S3Operation::ALL {
            let expected = if op.as_str().starts_with("Bucket") {
                Some(OperationTarget::Bucket)
            } else if op.as_str().starts_with("Object") {
                Some(OperationTarget::Object)
            } else if *op == S3Operation::Unclassified {
                None
            } else {
                Some(OperationTarget::Service)
            };
            assert_eq!(op.target(), expected, "{op}");
        }
    }

    #[test]
    fn test_should_require_bucket_and_key_for_object_operations() {
        assert!(S3Operation::ObjectRead.accepts_addressing(true, true));
        assert!(!S3Operation::ObjectRead.accepts_addressing(true, false));
        assert!(S3Operation::ObjectDeleteMultiple.accepts_addressing(true, false));
        assert!(!S3Operation::BucketRead.accepts_addressing(true, true));
        assert!(S3Operation::ListBuckets.accepts_addressing(false, false));
        assert!(S3Operation::Unclassified.accepts_addressing(false, true));
    }

    #[test]
    fn test_should_map_range_read_to_get_object() {
        assert_eq!(S3Operation::ObjectReadRange.aws_name(), "GetObject");
        assert_eq!(S3Operation::BucketReadVersions.aws_name(), "ListObjectVersions");
    }
}
