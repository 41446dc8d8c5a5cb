//! Wire types exchanged with operation handlers.
//!
//! Write operations receive one of these as their decoded request body, read
//! operations return one to be serialized as the XML response document.
//! Field names follow the XML element names in snake case.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the string value of this enum variant.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Parse the wire value, returning `None` for unknown values.
            #[must_use]
            pub fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// ACL permission.
    Permission {
        FullControl => "FULL_CONTROL",
        Read => "READ",
        ReadAcp => "READ_ACP",
        Write => "WRITE",
        WriteAcp => "WRITE_ACP",
    }
}

wire_enum! {
    /// Grantee kind carried in the `xsi:type` attribute.
    GranteeType {
        CanonicalUser => "CanonicalUser",
        AmazonCustomerByEmail => "AmazonCustomerByEmail",
        Group => "Group",
    }
}

wire_enum! {
    /// Bucket versioning state.
    BucketVersioningStatus {
        Enabled => "Enabled",
        Suspended => "Suspended",
    }
}

wire_enum! {
    /// MFA delete state in a versioning configuration.
    MfaDeleteStatus {
        Disabled => "Disabled",
        Enabled => "Enabled",
    }
}

wire_enum! {
    /// Legal hold state.
    ObjectLockLegalHoldStatus {
        Off => "OFF",
        On => "ON",
    }
}

wire_enum! {
    /// Retention mode.
    ObjectLockRetentionMode {
        Governance => "GOVERNANCE",
        Compliance => "COMPLIANCE",
    }
}

// ---------------------------------------------------------------------------
// ACL
// ---------------------------------------------------------------------------

/// Bucket or object owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// The subject of an ACL grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantee {
    pub r#type: GranteeType,
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub uri: Option<String>,
}

/// A single ACL grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Option<Grantee>,
    pub permission: Option<Permission>,
}

/// `<AccessControlPolicy>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPolicy {
    pub owner: Option<Owner>,
    pub grants: Vec<Grant>,
}

impl AccessControlPolicy {
    /// A policy granting `FULL_CONTROL` to the owner only.
    #[must_use]
    pub fn private(owner: Owner) -> Self {
        let grantee = Grantee {
            r#type: GranteeType::CanonicalUser,
            id: owner.id.clone(),
            display_name: owner.display_name.clone(),
            ..Grantee::default()
        };
        Self {
            owner: Some(owner),
            grants: vec![Grant {
                grantee: Some(grantee),
                permission: Some(Permission::FullControl),
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Tagging, logging, versioning, website
// ---------------------------------------------------------------------------

/// A key/value tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// `<Tagging>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagging {
    pub tag_set: Vec<Tag>,
}

/// Target of server access logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingEnabled {
    pub target_bucket: String,
    pub target_prefix: String,
    pub target_grants: Vec<Grant>,
}

/// `<BucketLoggingStatus>` document. No `logging_enabled` means logging is off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLoggingStatus {
    pub logging_enabled: Option<LoggingEnabled>,
}

/// `<VersioningConfiguration>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfiguration {
    pub status: Option<BucketVersioningStatus>,
    pub mfa_delete: Option<MfaDeleteStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectAllRequestsTo {
    pub host_name: String,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRuleCondition {
    pub http_error_code_returned_equals: Option<String>,
    pub key_prefix_equals: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub host_name: Option<String>,
    pub http_redirect_code: Option<String>,
    pub protocol: Option<String>,
    pub replace_key_prefix_with: Option<String>,
    pub replace_key_with: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub condition: Option<RoutingRuleCondition>,
    pub redirect: Redirect,
}

/// `<WebsiteConfiguration>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfiguration {
    pub index_document: Option<IndexDocument>,
    pub error_document: Option<ErrorDocument>,
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    pub routing_rules: Vec<RoutingRule>,
}

// ---------------------------------------------------------------------------
// Object lock
// ---------------------------------------------------------------------------

/// `<LegalHold>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLockLegalHold {
    pub status: Option<ObjectLockLegalHoldStatus>,
}

/// `<Retention>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLockRetention {
    pub mode: Option<ObjectLockRetentionMode>,
    pub retain_until_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Bucket creation and location
// ---------------------------------------------------------------------------

/// Optional `<CreateBucketConfiguration>` body of a bucket create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketConfiguration {
    pub location_constraint: Option<String>,
}

/// `<LocationConstraint>` document. `us-east-1` is written as an empty element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLocation {
    pub location_constraint: Option<String>,
}

// ---------------------------------------------------------------------------
// Multi-object delete
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    pub key: String,
    pub version_id: Option<String>,
}

/// `<Delete>` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    pub objects: Vec<ObjectIdentifier>,
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedObject {
    pub key: String,
    pub version_id: Option<String>,
    pub delete_marker: Option<bool>,
    pub delete_marker_version_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteError {
    pub key: String,
    pub version_id: Option<String>,
    pub code: String,
    pub message: String,
}

/// `<DeleteResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: Vec<DeletedObject>,
    pub errors: Vec<DeleteError>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Fields shared by every listing entry: objects, versions, delete markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub owner: Option<Owner>,
}

/// A bucket in a `ListAllMyBucketsResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub creation_date: DateTime<Utc>,
}

/// `<ListAllMyBucketsResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAllMyBucketsResult {
    pub owner: Option<Owner>,
    pub buckets: Vec<Bucket>,
}

/// An object in a `ListBucketResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub info: EntryInfo,
    pub e_tag: String,
    pub size: u64,
    pub storage_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonPrefix {
    pub prefix: String,
}

/// `<ListBucketResult>` document (both v1 and v2 listings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBucketResult {
    pub name: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: u32,
    pub is_truncated: bool,
    pub marker: Option<String>,
    pub next_marker: Option<String>,
    /// Present only in v2 (`list-type=2`) listings.
    pub key_count: Option<u32>,
    pub continuation_token: Option<String>,
    pub next_continuation_token: Option<String>,
    pub start_after: Option<String>,
    pub contents: Vec<Object>,
    pub common_prefixes: Vec<CommonPrefix>,
}

/// A stored object version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersion {
    pub info: EntryInfo,
    pub version_id: String,
    pub is_latest: bool,
    pub e_tag: String,
    pub size: u64,
    pub storage_class: Option<String>,
}

/// A delete marker left by a versioned delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMarkerEntry {
    pub info: EntryInfo,
    pub version_id: String,
    pub is_latest: bool,
}

/// One row of a versions listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionEntry {
    /// `<Version>`
    Version(ObjectVersion),
    /// `<DeleteMarker>`
    DeleteMarker(DeleteMarkerEntry),
}

impl VersionEntry {
    /// Fields shared by both kinds of entry.
    #[must_use]
    pub fn info(&self) -> &EntryInfo {
        match self {
            Self::Version(v) => &v.info,
            Self::DeleteMarker(m) => &m.info,
        }
    }
}

/// `<ListVersionsResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListVersionsResult {
    pub name: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub key_marker: Option<String>,
    pub version_id_marker: Option<String>,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
    pub max_keys: u32,
    pub is_truncated: bool,
    pub entries: Vec<VersionEntry>,
    pub common_prefixes: Vec<CommonPrefix>,
}

// ---------------------------------------------------------------------------
// Multipart uploads
// ---------------------------------------------------------------------------

/// `<InitiateMultipartUploadResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateMultipartUploadResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub e_tag: String,
}

/// `<CompleteMultipartUpload>` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedMultipartUpload {
    pub parts: Vec<CompletedPart>,
}

/// `<CompleteMultipartUploadResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteMultipartUploadResult {
    pub location: Option<String>,
    pub bucket: String,
    pub key: String,
    pub e_tag: String,
}

/// An uploaded part in a `ListPartsResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub part_number: u32,
    pub last_modified: DateTime<Utc>,
    pub e_tag: String,
    pub size: u64,
}

/// `<ListPartsResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPartsResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub owner: Option<Owner>,
    pub part_number_marker: Option<u32>,
    pub next_part_number_marker: Option<u32>,
    pub max_parts: u32,
    pub is_truncated: bool,
    pub parts: Vec<Part>,
}

/// An in-progress upload in a `ListMultipartUploadsResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartUpload {
    pub key: String,
    pub upload_id: String,
    pub initiated: DateTime<Utc>,
    pub owner: Option<Owner>,
    pub storage_class: Option<String>,
}

/// `<ListMultipartUploadsResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMultipartUploadsResult {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub key_marker: Option<String>,
    pub upload_id_marker: Option<String>,
    pub next_key_marker: Option<String>,
    pub next_upload_id_marker: Option<String>,
    pub max_uploads: u32,
    pub is_truncated: bool,
    pub uploads: Vec<MultipartUpload>,
    pub common_prefixes: Vec<CommonPrefix>,
}
