//! Writing response documents.
//!
//! Every document type implements [`S3Serialize`] by writing its child
//! elements; [`to_xml`] adds the declaration and the namespaced root
//! element. Nested types write their own enclosing element.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use s3gate_model::types::{
    AccessControlPolicy, Bucket, BucketLocation, BucketLoggingStatus, CommonPrefix,
    CompleteMultipartUploadResult, CompletedMultipartUpload, CompletedPart,
    CreateBucketConfiguration, Delete, DeleteError, DeleteMarkerEntry, DeleteResult,
    DeletedObject, EntryInfo, Grant, Grantee, InitiateMultipartUploadResult,
    ListAllMyBucketsResult, ListBucketResult, ListMultipartUploadsResult, ListPartsResult,
    ListVersionsResult, LoggingEnabled, MultipartUpload, Object, ObjectIdentifier,
    ObjectLockLegalHold, ObjectLockRetention, ObjectVersion, Owner, Part, RoutingRule, Tag,
    Tagging, VersionEntry, VersioningConfiguration, WebsiteConfiguration,
};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A value that can be written as the content of an S3 XML element.
pub trait S3Serialize {
    /// Write this value into `writer`.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Write a complete document with `root_element` as its namespaced root.
///
/// # Examples
///
/// ```
/// use s3gate_model::types::{Tag, Tagging};
/// use s3gate_xml::to_xml;
///
/// let tagging = Tagging { tag_set: vec![Tag { key: "env".into(), value: "dev".into() }] };
/// let xml = String::from_utf8(to_xml("Tagging", &tagging).unwrap()).unwrap();
/// assert!(xml.contains("<TagSet><Tag><Key>env</Key><Value>dev</Value></Tag></TagSet>"));
/// ```
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;
    Ok(buf)
}

/// `2006-02-03T16:45:09.000Z`
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

pub(crate) fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text_element(writer, tag, if value { "true" } else { "false" })
}

fn write_number<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: impl std::fmt::Display,
) -> io::Result<()> {
    write_text_element(writer, tag, &value.to_string())
}

fn write_timestamp<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &DateTime<Utc>,
) -> io::Result<()> {
    write_text_element(writer, tag, &format_timestamp(value))
}

fn write_all<W: Write, T: S3Serialize>(writer: &mut Writer<W>, items: &[T]) -> io::Result<()> {
    for item in items {
        item.serialize_xml(writer)?;
    }
    Ok(())
}

fn write_optional<W: Write, T: S3Serialize>(
    writer: &mut Writer<W>,
    item: Option<&T>,
) -> io::Result<()> {
    match item {
        Some(item) => item.serialize_xml(writer),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// ACL
// ---------------------------------------------------------------------------

impl S3Serialize for Owner {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Owner").write_inner_content(|w| {
            write_optional_text(w, "ID", self.id.as_deref())?;
            write_optional_text(w, "DisplayName", self.display_name.as_deref())
        })?;
        Ok(())
    }
}

impl S3Serialize for Grantee {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("Grantee")
            .with_attribute(("xmlns:xsi", XSI_NAMESPACE))
            .with_attribute(("xsi:type", self.r#type.as_str()))
            .write_inner_content(|w| {
                write_optional_text(w, "ID", self.id.as_deref())?;
                write_optional_text(w, "DisplayName", self.display_name.as_deref())?;
                write_optional_text(w, "EmailAddress", self.email_address.as_deref())?;
                write_optional_text(w, "URI", self.uri.as_deref())
            })?;
        Ok(())
    }
}

impl S3Serialize for Grant {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Grant").write_inner_content(|w| {
            write_optional(w, self.grantee.as_ref())?;
            write_optional_text(w, "Permission", self.permission.map(|p| p.as_str()))
        })?;
        Ok(())
    }
}

impl S3Serialize for AccessControlPolicy {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional(writer, self.owner.as_ref())?;
        writer
            .create_element("AccessControlList")
            .write_inner_content(|w| write_all(w, &self.grants))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tagging, logging, versioning, website
// ---------------------------------------------------------------------------

impl S3Serialize for Tag {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Tag").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_text_element(w, "Value", &self.value)
        })?;
        Ok(())
    }
}

impl S3Serialize for Tagging {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("TagSet")
            .write_inner_content(|w| write_all(w, &self.tag_set))?;
        Ok(())
    }
}

impl S3Serialize for LoggingEnabled {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("LoggingEnabled")
            .write_inner_content(|w| {
                write_text_element(w, "TargetBucket", &self.target_bucket)?;
                if !self.target_grants.is_empty() {
                    w.create_element("TargetGrants")
                        .write_inner_content(|w| write_all(w, &self.target_grants))?;
                }
                write_text_element(w, "TargetPrefix", &self.target_prefix)
            })?;
        Ok(())
    }
}

impl S3Serialize for BucketLoggingStatus {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional(writer, self.logging_enabled.as_ref())
    }
}

impl S3Serialize for VersioningConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(writer, "Status", self.status.map(|s| s.as_str()))?;
        write_optional_text(writer, "MfaDelete", self.mfa_delete.map(|s| s.as_str()))
    }
}

impl S3Serialize for RoutingRule {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("RoutingRule").write_inner_content(|w| {
            if let Some(condition) = &self.condition {
                w.create_element("Condition").write_inner_content(|w| {
                    write_optional_text(
                        w,
                        "HttpErrorCodeReturnedEquals",
                        condition.http_error_code_returned_equals.as_deref(),
                    )?;
                    write_optional_text(
                        w,
                        "KeyPrefixEquals",
                        condition.key_prefix_equals.as_deref(),
                    )
                })?;
            }
            let redirect = &self.redirect;
            w.create_element("Redirect").write_inner_content(|w| {
                write_optional_text(w, "HostName", redirect.host_name.as_deref())?;
                write_optional_text(
                    w,
                    "HttpRedirectCode",
                    redirect.http_redirect_code.as_deref(),
                )?;
                write_optional_text(w, "Protocol", redirect.protocol.as_deref())?;
                write_optional_text(
                    w,
                    "ReplaceKeyPrefixWith",
                    redirect.replace_key_prefix_with.as_deref(),
                )?;
                write_optional_text(w, "ReplaceKeyWith", redirect.replace_key_with.as_deref())
            })?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for WebsiteConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if let Some(redirect) = &self.redirect_all_requests_to {
            writer
                .create_element("RedirectAllRequestsTo")
                .write_inner_content(|w| {
                    write_text_element(w, "HostName", &redirect.host_name)?;
                    write_optional_text(w, "Protocol", redirect.protocol.as_deref())
                })?;
        }
        if let Some(index) = &self.index_document {
            writer
                .create_element("IndexDocument")
                .write_inner_content(|w| write_text_element(w, "Suffix", &index.suffix))?;
        }
        if let Some(error) = &self.error_document {
            writer
                .create_element("ErrorDocument")
                .write_inner_content(|w| write_text_element(w, "Key", &error.key))?;
        }
        if !self.routing_rules.is_empty() {
            writer
                .create_element("RoutingRules")
                .write_inner_content(|w| write_all(w, &self.routing_rules))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object lock
// ---------------------------------------------------------------------------

impl S3Serialize for ObjectLockLegalHold {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(writer, "Status", self.status.map(|s| s.as_str()))
    }
}

impl S3Serialize for ObjectLockRetention {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(writer, "Mode", self.mode.map(|m| m.as_str()))?;
        if let Some(date) = &self.retain_until_date {
            write_timestamp(writer, "RetainUntilDate", date)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bucket creation and location
// ---------------------------------------------------------------------------

impl S3Serialize for CreateBucketConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(
            writer,
            "LocationConstraint",
            self.location_constraint.as_deref(),
        )
    }
}

/// Written as the text of the root `<LocationConstraint>` element, which is
/// empty for `us-east-1`.
impl S3Serialize for BucketLocation {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if let Some(location) = self.location_constraint.as_deref() {
            writer.write_event(Event::Text(BytesText::new(location)))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Multi-object delete
// ---------------------------------------------------------------------------

impl S3Serialize for ObjectIdentifier {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Object").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_optional_text(w, "VersionId", self.version_id.as_deref())
        })?;
        Ok(())
    }
}

impl S3Serialize for Delete {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_all(writer, &self.objects)?;
        if self.quiet {
            write_bool(writer, "Quiet", true)?;
        }
        Ok(())
    }
}

impl S3Serialize for DeletedObject {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Deleted").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_optional_text(w, "VersionId", self.version_id.as_deref())?;
            if let Some(marker) = self.delete_marker {
                write_bool(w, "DeleteMarker", marker)?;
            }
            write_optional_text(
                w,
                "DeleteMarkerVersionId",
                self.delete_marker_version_id.as_deref(),
            )
        })?;
        Ok(())
    }
}

impl S3Serialize for DeleteError {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Error").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_optional_text(w, "VersionId", self.version_id.as_deref())?;
            write_text_element(w, "Code", &self.code)?;
            write_text_element(w, "Message", &self.message)
        })?;
        Ok(())
    }
}

impl S3Serialize for DeleteResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_all(writer, &self.deleted)?;
        write_all(writer, &self.errors)
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

impl S3Serialize for Bucket {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Bucket").write_inner_content(|w| {
            write_text_element(w, "Name", &self.name)?;
            write_timestamp(w, "CreationDate", &self.creation_date)
        })?;
        Ok(())
    }
}

impl S3Serialize for ListAllMyBucketsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional(writer, self.owner.as_ref())?;
        writer
            .create_element("Buckets")
            .write_inner_content(|w| write_all(w, &self.buckets))?;
        Ok(())
    }
}

impl S3Serialize for CommonPrefix {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("CommonPrefixes")
            .write_inner_content(|w| write_text_element(w, "Prefix", &self.prefix))?;
        Ok(())
    }
}

/// Key, modification time and owner shared by listing entries.
fn write_entry_info<W: Write>(writer: &mut Writer<W>, info: &EntryInfo) -> io::Result<()> {
    write_text_element(writer, "Key", &info.key)?;
    write_timestamp(writer, "LastModified", &info.last_modified)
}

impl S3Serialize for Object {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Contents").write_inner_content(|w| {
            write_entry_info(w, &self.info)?;
            write_text_element(w, "ETag", &self.e_tag)?;
            write_number(w, "Size", self.size)?;
            write_optional_text(w, "StorageClass", self.storage_class.as_deref())?;
            write_optional(w, self.info.owner.as_ref())
        })?;
        Ok(())
    }
}

/// The V2 layout (`KeyCount`, continuation tokens) is written when
/// `key_count` is set, otherwise the V1 layout (`Marker`).
impl S3Serialize for ListBucketResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_text_element(w, "Name", &self.name)?;
        write_text_element(w, "Prefix", self.prefix.as_deref().unwrap_or(""))?;
        if let Some(key_count) = self.key_count {
            write_number(w, "KeyCount", key_count)?;
            write_optional_text(w, "ContinuationToken", self.continuation_token.as_deref())?;
            write_optional_text(
                w,
                "NextContinuationToken",
                self.next_continuation_token.as_deref(),
            )?;
            write_optional_text(w, "StartAfter", self.start_after.as_deref())?;
        } else {
            write_text_element(w, "Marker", self.marker.as_deref().unwrap_or(""))?;
            write_optional_text(w, "NextMarker", self.next_marker.as_deref())?;
        }
        write_number(w, "MaxKeys", self.max_keys)?;
        write_optional_text(w, "Delimiter", self.delimiter.as_deref())?;
        write_bool(w, "IsTruncated", self.is_truncated)?;
        write_all(w, &self.contents)?;
        write_all(w, &self.common_prefixes)
    }
}

impl S3Serialize for ObjectVersion {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Version").write_inner_content(|w| {
            write_text_element(w, "Key", &self.info.key)?;
            write_text_element(w, "VersionId", &self.version_id)?;
            write_bool(w, "IsLatest", self.is_latest)?;
            write_timestamp(w, "LastModified", &self.info.last_modified)?;
            write_text_element(w, "ETag", &self.e_tag)?;
            write_number(w, "Size", self.size)?;
            write_optional_text(w, "StorageClass", self.storage_class.as_deref())?;
            write_optional(w, self.info.owner.as_ref())
        })?;
        Ok(())
    }
}

impl S3Serialize for DeleteMarkerEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("DeleteMarker").write_inner_content(|w| {
            write_text_element(w, "Key", &self.info.key)?;
            write_text_element(w, "VersionId", &self.version_id)?;
            write_bool(w, "IsLatest", self.is_latest)?;
            write_timestamp(w, "LastModified", &self.info.last_modified)?;
            write_optional(w, self.info.owner.as_ref())
        })?;
        Ok(())
    }
}

impl S3Serialize for VersionEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        match self {
            Self::Version(v) => v.serialize_xml(writer),
            Self::DeleteMarker(m) => m.serialize_xml(writer),
        }
    }
}

impl S3Serialize for ListVersionsResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_text_element(w, "Name", &self.name)?;
        write_text_element(w, "Prefix", self.prefix.as_deref().unwrap_or(""))?;
        write_text_element(w, "KeyMarker", self.key_marker.as_deref().unwrap_or(""))?;
        write_text_element(
            w,
            "VersionIdMarker",
            self.version_id_marker.as_deref().unwrap_or(""),
        )?;
        write_optional_text(w, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_optional_text(
            w,
            "NextVersionIdMarker",
            self.next_version_id_marker.as_deref(),
        )?;
        write_number(w, "MaxKeys", self.max_keys)?;
        write_optional_text(w, "Delimiter", self.delimiter.as_deref())?;
        write_bool(w, "IsTruncated", self.is_truncated)?;
        write_all(w, &self.entries)?;
        write_all(w, &self.common_prefixes)
    }
}

// ---------------------------------------------------------------------------
// Multipart uploads
// ---------------------------------------------------------------------------

impl S3Serialize for InitiateMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_text_element(w, "Bucket", &self.bucket)?;
        write_text_element(w, "Key", &self.key)?;
        write_text_element(w, "UploadId", &self.upload_id)
    }
}

impl S3Serialize for CompletedPart {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Part").write_inner_content(|w| {
            write_number(w, "PartNumber", self.part_number)?;
            write_text_element(w, "ETag", &self.e_tag)
        })?;
        Ok(())
    }
}

impl S3Serialize for CompletedMultipartUpload {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_all(writer, &self.parts)
    }
}

impl S3Serialize for CompleteMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(w, "Location", self.location.as_deref())?;
        write_text_element(w, "Bucket", &self.bucket)?;
        write_text_element(w, "Key", &self.key)?;
        write_text_element(w, "ETag", &self.e_tag)
    }
}

impl S3Serialize for Part {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Part").write_inner_content(|w| {
            write_number(w, "PartNumber", self.part_number)?;
            write_timestamp(w, "LastModified", &self.last_modified)?;
            write_text_element(w, "ETag", &self.e_tag)?;
            write_number(w, "Size", self.size)
        })?;
        Ok(())
    }
}

impl S3Serialize for ListPartsResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_text_element(w, "Bucket", &self.bucket)?;
        write_text_element(w, "Key", &self.key)?;
        write_text_element(w, "UploadId", &self.upload_id)?;
        write_optional(w, self.owner.as_ref())?;
        if let Some(marker) = self.part_number_marker {
            write_number(w, "PartNumberMarker", marker)?;
        }
        if let Some(marker) = self.next_part_number_marker {
            write_number(w, "NextPartNumberMarker", marker)?;
        }
        write_number(w, "MaxParts", self.max_parts)?;
        write_bool(w, "IsTruncated", self.is_truncated)?;
        write_all(w, &self.parts)
    }
}

impl S3Serialize for MultipartUpload {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Upload").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_text_element(w, "UploadId", &self.upload_id)?;
            write_optional(w, self.owner.as_ref())?;
            write_optional_text(w, "StorageClass", self.storage_class.as_deref())?;
            write_timestamp(w, "Initiated", &self.initiated)
        })?;
        Ok(())
    }
}

impl S3Serialize for ListMultipartUploadsResult {
    fn serialize_xml<W: Write>(&self, w: &mut Writer<W>) -> io::Result<()> {
        write_text_element(w, "Bucket", &self.bucket)?;
        write_text_element(w, "KeyMarker", self.key_marker.as_deref().unwrap_or(""))?;
        write_text_element(
            w,
            "UploadIdMarker",
            self.upload_id_marker.as_deref().unwrap_or(""),
        )?;
        write_optional_text(w, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_optional_text(
            w,
            "NextUploadIdMarker",
            self.next_upload_id_marker.as_deref(),
        )?;
        write_optional_text(w, "Prefix", self.prefix.as_deref())?;
        write_optional_text(w, "Delimiter", self.delimiter.as_deref())?;
        write_number(w, "MaxUploads", self.max_uploads)?;
        write_bool(w, "IsTruncated", self.is_truncated)?;
        write_all(w, &self.uploads)?;
        write_all(w, &self.common_prefixes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use s3gate_model::types::{
        BucketVersioningStatus, GranteeType, IndexDocument, ObjectLockRetentionMode, Permission,
    };

    use super::*;

    fn xml_string<T: S3Serialize>(root: &str, value: &T) -> String {
        String::from_utf8(to_xml(root, value).unwrap()).unwrap()
    }

    fn owner() -> Owner {
        Owner {
            id: Some("75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a".to_owned()),
            display_name: Some("webfile".to_owned()),
        }
    }

    #[test]
    fn test_should_write_declaration_and_namespace() {
        let xml = xml_string("VersioningConfiguration", &VersioningConfiguration::default());
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <VersioningConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             </VersioningConfiguration>"
        );
    }

    #[test]
    fn test_should_write_list_all_my_buckets() {
        let result = ListAllMyBucketsResult {
            owner: Some(owner()),
            buckets: vec![Bucket {
                name: "example".to_owned(),
                creation_date: Utc.with_ymd_and_hms(2006, 2, 3, 16, 45, 9).unwrap(),
            }],
        };
        let xml = xml_string("ListAllMyBucketsResult", &result);
        assert!(xml.contains("<Owner><ID>75aa57f0"));
        assert!(xml.contains("<DisplayName>webfile</DisplayName></Owner>"));
        assert!(xml.contains(
            "<Buckets><Bucket><Name>example</Name>\
             <CreationDate>2006-02-03T16:45:09.000Z</CreationDate></Bucket></Buckets>"
        ));
    }

    #[test]
    fn test_should_write_grantee_type_attribute() {
        let policy = AccessControlPolicy {
            owner: Some(owner()),
            grants: vec![Grant {
                grantee: Some(Grantee {
                    r#type: GranteeType::Group,
                    uri: Some("http://acs.amazonaws.com/groups/global/AllUsers".to_owned()),
                    ..Grantee::default()
                }),
                permission: Some(Permission::Read),
            }],
        };
        let xml = xml_string("AccessControlPolicy", &policy);
        assert!(xml.contains(
            "<Grantee xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"Group\">"
        ));
        assert!(xml.contains("<Permission>READ</Permission>"));
        assert!(xml.contains("<AccessControlList><Grant>"));
    }

    #[test]
    fn test_should_write_v1_listing_with_marker() {
        let result = ListBucketResult {
            name: "bucket".to_owned(),
            max_keys: 1000,
            contents: vec![Object {
                info: EntryInfo {
                    key: "a.txt".to_owned(),
                    ..EntryInfo::default()
                },
                e_tag: "\"abc\"".to_owned(),
                size: 5,
                storage_class: Some("STANDARD".to_owned()),
            }],
            common_prefixes: vec![CommonPrefix {
                prefix: "photos/".to_owned(),
            }],
            ..ListBucketResult::default()
        };
        let xml = xml_string("ListBucketResult", &result);
        assert!(xml.contains("<Name>bucket</Name><Prefix></Prefix><Marker></Marker>"));
        assert!(!xml.contains("KeyCount"));
        assert!(xml.contains("<Size>5</Size><StorageClass>STANDARD</StorageClass>"));
        assert!(xml.contains("<CommonPrefixes><Prefix>photos/</Prefix></CommonPrefixes>"));
        assert!(xml.contains("<IsTruncated>false</IsTruncated>"));
    }

    #[test]
    fn test_should_write_v2_listing_with_key_count() {
        let result = ListBucketResult {
            name: "bucket".to_owned(),
            key_count: Some(0),
            next_continuation_token: Some("tok".to_owned()),
            is_truncated: true,
            ..ListBucketResult::default()
        };
        let xml = xml_string("ListBucketResult", &result);
        assert!(xml.contains("<KeyCount>0</KeyCount>"));
        assert!(xml.contains("<NextContinuationToken>tok</NextContinuationToken>"));
        assert!(!xml.contains("<Marker>"));
    }

    #[test]
    fn test_should_keep_version_and_marker_order() {
        let result = ListVersionsResult {
            name: "bucket".to_owned(),
            entries: vec![
                VersionEntry::DeleteMarker(DeleteMarkerEntry {
                    info: EntryInfo {
                        key: "k".to_owned(),
                        ..EntryInfo::default()
                    },
                    version_id: "v2".to_owned(),
                    is_latest: true,
                }),
                VersionEntry::Version(ObjectVersion {
                    info: EntryInfo {
                        key: "k".to_owned(),
                        ..EntryInfo::default()
                    },
                    version_id: "v1".to_owned(),
                    ..ObjectVersion::default()
                }),
            ],
            ..ListVersionsResult::default()
        };
        let xml = xml_string("ListVersionsResult", &result);
        let marker = xml.find("<DeleteMarker>").unwrap();
        let version = xml.find("<Version>").unwrap();
        assert!(marker < version);
    }

    #[test]
    fn test_should_write_location_constraint_as_root_text() {
        let xml = xml_string(
            "LocationConstraint",
            &BucketLocation {
                location_constraint: Some("eu-west-1".to_owned()),
            },
        );
        assert!(xml.ends_with(
            "<LocationConstraint xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">eu-west-1</LocationConstraint>"
        ));
    }

    #[test]
    fn test_should_write_delete_result_entries() {
        let result = DeleteResult {
            deleted: vec![DeletedObject {
                key: "a".to_owned(),
                ..DeletedObject::default()
            }],
            errors: vec![DeleteError {
                key: "b".to_owned(),
                code: "AccessDenied".to_owned(),
                message: "Access Denied".to_owned(),
                ..DeleteError::default()
            }],
        };
        let xml = xml_string("DeleteResult", &result);
        assert!(xml.contains("<Deleted><Key>a</Key></Deleted>"));
        assert!(xml.contains("<Error><Key>b</Key><Code>AccessDenied</Code>"));
    }

    #[test]
    fn test_should_write_website_and_versioning_documents() {
        let website = WebsiteConfiguration {
            index_document: Some(IndexDocument {
                suffix: "index.html".to_owned(),
            }),
            ..WebsiteConfiguration::default()
        };
        let xml = xml_string("WebsiteConfiguration", &website);
        assert!(xml.contains("<IndexDocument><Suffix>index.html</Suffix></IndexDocument>"));
        assert!(!xml.contains("RoutingRules"));

        let versioning = VersioningConfiguration {
            status: Some(BucketVersioningStatus::Enabled),
            mfa_delete: None,
        };
        assert!(xml_string("VersioningConfiguration", &versioning)
            .contains("<Status>Enabled</Status>"));
    }

    #[test]
    fn test_should_write_retention_date_with_millis() {
        let retention = ObjectLockRetention {
            mode: Some(ObjectLockRetentionMode::Governance),
            retain_until_date: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
        };
        let xml = xml_string("Retention", &retention);
        assert!(xml.contains("<Mode>GOVERNANCE</Mode>"));
        assert!(xml.contains("<RetainUntilDate>2030-01-01T00:00:00.000Z</RetainUntilDate>"));
    }
}
