//! Reading request bodies.
//!
//! [`from_xml`] positions the reader inside the root element and hands it to
//! the type's [`S3Deserialize`] impl. Unknown elements are skipped.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use s3gate_model::types::{
    AccessControlPolicy, BucketLoggingStatus, BucketVersioningStatus, CompletedMultipartUpload,
    CompletedPart, CreateBucketConfiguration, Delete, ErrorDocument, Grant, Grantee, GranteeType,
    IndexDocument, LoggingEnabled, MfaDeleteStatus, ObjectIdentifier, ObjectLockLegalHold,
    ObjectLockLegalHoldStatus, ObjectLockRetention, ObjectLockRetentionMode, Owner, Permission,
    Redirect, RedirectAllRequestsTo, RoutingRule, RoutingRuleCondition, Tag, Tagging,
    VersioningConfiguration, WebsiteConfiguration,
};

use crate::error::XmlError;

/// A value that can be read from the content of an S3 XML element.
pub trait S3Deserialize: Sized {
    /// Read this value.
    ///
    /// The reader is positioned just after the opening tag; the impl consumes
    /// everything up to and including the matching end tag.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Parse a request body.
///
/// # Examples
///
/// ```
/// use s3gate_model::types::Tagging;
/// use s3gate_xml::from_xml;
///
/// let body = b"<Tagging><TagSet><Tag><Key>a</Key><Value>1</Value></Tag></TagSet></Tagging>";
/// let tagging: Tagging = from_xml(body).unwrap();
/// assert_eq!(tagging.tag_set[0].key, "a");
/// ```
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(_) => return T::deserialize_xml(&mut reader),
            Event::Eof => return Err(XmlError::MissingElement("root element".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reader helpers
// ---------------------------------------------------------------------------

/// Walk the children of the current element.
///
/// `on_child` receives each child's local name and start tag and must
/// consume the child through its end tag. Returns after the parent's end tag.
fn read_children<'a, F>(
    reader: &mut Reader<&'a [u8]>,
    context: &str,
    mut on_child: F,
) -> Result<(), XmlError>
where
    F: FnMut(&mut Reader<&'a [u8]>, &str, &BytesStart<'a>) -> Result<(), XmlError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                on_child(reader, &name, &start)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in {context}"
                )));
            }
            _ => {}
        }
    }
}

/// Read the text of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::GeneralRef(r) => {
                let name = r
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                if let Some(ch) = r
                    .resolve_char_ref()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?
                {
                    text.push(ch);
                } else if let Some(value) = quick_xml::escape::resolve_predefined_entity(&name) {
                    text.push_str(value);
                } else {
                    return Err(XmlError::ParseError(format!("unknown entity: {name}")));
                }
            }
            Event::CData(data) => text.push_str(&String::from_utf8_lossy(&data)),
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip the current element and everything inside it.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

fn parse_u32(s: &str) -> Result<u32, XmlError> {
    s.parse::<u32>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

fn parse_enum<T>(s: &str, from_wire: fn(&str) -> Option<T>, field: &str) -> Result<T, XmlError> {
    from_wire(s).ok_or_else(|| XmlError::ParseError(format!("invalid {field}: {s}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, XmlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| XmlError::ParseError(format!("invalid timestamp '{s}': {e}")))
}

/// Read the child elements of a list wrapper such as `TagSet`.
fn read_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item: &str,
    out: &mut Vec<T>,
) -> Result<(), XmlError> {
    read_children(reader, item, |reader, name, _| {
        if name == item {
            out.push(T::deserialize_xml(reader)?);
            Ok(())
        } else {
            skip_element(reader)
        }
    })
}

// ---------------------------------------------------------------------------
// ACL
// ---------------------------------------------------------------------------

impl S3Deserialize for Owner {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut owner = Self::default();
        read_children(reader, "Owner", |reader, name, _| {
            match name {
                "ID" => owner.id = Some(read_text_content(reader)?),
                "DisplayName" => owner.display_name = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(owner)
    }
}

/// `xsi:type` of a `<Grantee>` start tag.
fn grantee_type(start: &BytesStart<'_>) -> Result<Option<GranteeType>, XmlError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"type" {
            let value = String::from_utf8_lossy(&attr.value);
            return parse_enum(&value, GranteeType::from_wire, "grantee type").map(Some);
        }
    }
    Ok(None)
}

impl S3Deserialize for Grantee {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut grantee = Self::default();
        read_children(reader, "Grantee", |reader, name, _| {
            match name {
                "ID" => grantee.id = Some(read_text_content(reader)?),
                "DisplayName" => grantee.display_name = Some(read_text_content(reader)?),
                "EmailAddress" => grantee.email_address = Some(read_text_content(reader)?),
                "URI" => grantee.uri = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(grantee)
    }
}

impl S3Deserialize for Grant {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut grant = Self::default();
        read_children(reader, "Grant", |reader, name, start| {
            match name {
                "Grantee" => {
                    let r#type = grantee_type(start)?;
                    let mut grantee = Grantee::deserialize_xml(reader)?;
                    grantee.r#type = r#type.unwrap_or(GranteeType::CanonicalUser);
                    grant.grantee = Some(grantee);
                }
                "Permission" => {
                    let text = read_text_content(reader)?;
                    grant.permission = Some(parse_enum(&text, Permission::from_wire, "permission")?);
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(grant)
    }
}

impl S3Deserialize for AccessControlPolicy {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut policy = Self::default();
        read_children(reader, "AccessControlPolicy", |reader, name, _| {
            match name {
                "Owner" => policy.owner = Some(Owner::deserialize_xml(reader)?),
                "AccessControlList" => read_list(reader, "Grant", &mut policy.grants)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(policy)
    }
}

// ---------------------------------------------------------------------------
// Tagging, logging, versioning, website
// ---------------------------------------------------------------------------

impl S3Deserialize for Tag {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut value = None;
        read_children(reader, "Tag", |reader, name, _| {
            match name {
                "Key" => key = Some(read_text_content(reader)?),
                "Value" => value = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(Self {
            key: key.ok_or_else(|| XmlError::MissingElement("Key".to_owned()))?,
            value: value.unwrap_or_default(),
        })
    }
}

impl S3Deserialize for Tagging {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut tagging = Self::default();
        read_children(reader, "Tagging", |reader, name, _| {
            if name == "TagSet" {
                read_list(reader, "Tag", &mut tagging.tag_set)
            } else {
                skip_element(reader)
            }
        })?;
        Ok(tagging)
    }
}

impl S3Deserialize for LoggingEnabled {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut logging = Self::default();
        read_children(reader, "LoggingEnabled", |reader, name, _| {
            match name {
                "TargetBucket" => logging.target_bucket = read_text_content(reader)?,
                "TargetPrefix" => logging.target_prefix = read_text_content(reader)?,
                "TargetGrants" => read_list(reader, "Grant", &mut logging.target_grants)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(logging)
    }
}

impl S3Deserialize for BucketLoggingStatus {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut status = Self::default();
        read_children(reader, "BucketLoggingStatus", |reader, name, _| {
            if name == "LoggingEnabled" {
                status.logging_enabled = Some(LoggingEnabled::deserialize_xml(reader)?);
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(status)
    }
}

impl S3Deserialize for VersioningConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = Self::default();
        read_children(reader, "VersioningConfiguration", |reader, name, _| {
            match name {
                "Status" => {
                    let text = read_text_content(reader)?;
                    config.status = Some(parse_enum(
                        &text,
                        BucketVersioningStatus::from_wire,
                        "versioning status",
                    )?);
                }
                "MfaDelete" => {
                    let text = read_text_content(reader)?;
                    config.mfa_delete =
                        Some(parse_enum(&text, MfaDeleteStatus::from_wire, "MFA delete")?);
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(config)
    }
}

impl S3Deserialize for IndexDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut doc = Self::default();
        read_children(reader, "IndexDocument", |reader, name, _| {
            if name == "Suffix" {
                doc.suffix = read_text_content(reader)?;
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(doc)
    }
}

impl S3Deserialize for ErrorDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut doc = Self::default();
        read_children(reader, "ErrorDocument", |reader, name, _| {
            if name == "Key" {
                doc.key = read_text_content(reader)?;
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(doc)
    }
}

impl S3Deserialize for RedirectAllRequestsTo {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut redirect = Self::default();
        read_children(reader, "RedirectAllRequestsTo", |reader, name, _| {
            match name {
                "HostName" => redirect.host_name = read_text_content(reader)?,
                "Protocol" => redirect.protocol = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(redirect)
    }
}

impl S3Deserialize for RoutingRuleCondition {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut condition = Self::default();
        read_children(reader, "Condition", |reader, name, _| {
            match name {
                "HttpErrorCodeReturnedEquals" => {
                    condition.http_error_code_returned_equals = Some(read_text_content(reader)?);
                }
                "KeyPrefixEquals" => condition.key_prefix_equals = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(condition)
    }
}

impl S3Deserialize for Redirect {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut redirect = Self::default();
        read_children(reader, "Redirect", |reader, name, _| {
            let slot = match name {
                "HostName" => &mut redirect.host_name,
                "HttpRedirectCode" => &mut redirect.http_redirect_code,
                "Protocol" => &mut redirect.protocol,
                "ReplaceKeyPrefixWith" => &mut redirect.replace_key_prefix_with,
                "ReplaceKeyWith" => &mut redirect.replace_key_with,
                _ => return skip_element(reader),
            };
            *slot = Some(read_text_content(reader)?);
            Ok(())
        })?;
        Ok(redirect)
    }
}

impl S3Deserialize for RoutingRule {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut rule = Self::default();
        read_children(reader, "RoutingRule", |reader, name, _| {
            match name {
                "Condition" => rule.condition = Some(RoutingRuleCondition::deserialize_xml(reader)?),
                "Redirect" => rule.redirect = Redirect::deserialize_xml(reader)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(rule)
    }
}

impl S3Deserialize for WebsiteConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = Self::default();
        read_children(reader, "WebsiteConfiguration", |reader, name, _| {
            match name {
                "IndexDocument" => {
                    config.index_document = Some(IndexDocument::deserialize_xml(reader)?);
                }
                "ErrorDocument" => {
                    config.error_document = Some(ErrorDocument::deserialize_xml(reader)?);
                }
                "RedirectAllRequestsTo" => {
                    config.redirect_all_requests_to =
                        Some(RedirectAllRequestsTo::deserialize_xml(reader)?);
                }
                "RoutingRules" => read_list(reader, "RoutingRule", &mut config.routing_rules)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Object lock
// ---------------------------------------------------------------------------

impl S3Deserialize for ObjectLockLegalHold {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut hold = Self::default();
        read_children(reader, "LegalHold", |reader, name, _| {
            if name == "Status" {
                let text = read_text_content(reader)?;
                hold.status = Some(parse_enum(
                    &text,
                    ObjectLockLegalHoldStatus::from_wire,
                    "legal hold status",
                )?);
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(hold)
    }
}

impl S3Deserialize for ObjectLockRetention {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut retention = Self::default();
        read_children(reader, "Retention", |reader, name, _| {
            match name {
                "Mode" => {
                    let text = read_text_content(reader)?;
                    retention.mode = Some(parse_enum(
                        &text,
                        ObjectLockRetentionMode::from_wire,
                        "retention mode",
                    )?);
                }
                "RetainUntilDate" => {
                    retention.retain_until_date =
                        Some(parse_timestamp(&read_text_content(reader)?)?);
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(retention)
    }
}

// ---------------------------------------------------------------------------
// Bucket creation, multi-object delete, multipart completion
// ---------------------------------------------------------------------------

impl S3Deserialize for CreateBucketConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = Self::default();
        read_children(reader, "CreateBucketConfiguration", |reader, name, _| {
            if name == "LocationConstraint" {
                let text = read_text_content(reader)?;
                config.location_constraint = (!text.is_empty()).then_some(text);
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(config)
    }
}

impl S3Deserialize for ObjectIdentifier {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut version_id = None;
        read_children(reader, "Object", |reader, name, _| {
            match name {
                "Key" => key = Some(read_text_content(reader)?),
                "VersionId" => version_id = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(Self {
            key: key.ok_or_else(|| XmlError::MissingElement("Key".to_owned()))?,
            version_id,
        })
    }
}

impl S3Deserialize for Delete {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut delete = Self::default();
        read_children(reader, "Delete", |reader, name, _| {
            match name {
                "Object" => delete.objects.push(ObjectIdentifier::deserialize_xml(reader)?),
                "Quiet" => delete.quiet = parse_bool(&read_text_content(reader)?)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(delete)
    }
}

impl S3Deserialize for CompletedPart {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut part_number = None;
        let mut e_tag = None;
        read_children(reader, "Part", |reader, name, _| {
            match name {
                "PartNumber" => part_number = Some(parse_u32(&read_text_content(reader)?)?),
                "ETag" => e_tag = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(Self {
            part_number: part_number
                .ok_or_else(|| XmlError::MissingElement("PartNumber".to_owned()))?,
            e_tag: e_tag.ok_or_else(|| XmlError::MissingElement("ETag".to_owned()))?,
        })
    }
}

impl S3Deserialize for CompletedMultipartUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut upload = Self::default();
        read_children(reader, "CompleteMultipartUpload", |reader, name, _| {
            if name == "Part" {
                upload.parts.push(CompletedPart::deserialize_xml(reader)?);
                Ok(())
            } else {
                skip_element(reader)
            }
        })?;
        Ok(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::to_xml;

    #[test]
    fn test_should_parse_access_control_policy_with_grantee_types() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <AccessControlPolicy xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
              <Owner><ID>owner-id</ID><DisplayName>owner</DisplayName></Owner>
              <AccessControlList>
                <Grant>
                  <Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="CanonicalUser">
                    <ID>owner-id</ID>
                  </Grantee>
                  <Permission>FULL_CONTROL</Permission>
                </Grant>
                <Grant>
                  <Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="Group">
                    <URI>http://acs.amazonaws.com/groups/global/AllUsers</URI>
                  </Grantee>
                  <Permission>READ</Permission>
                </Grant>
              </AccessControlList>
            </AccessControlPolicy>"#;

        let policy: AccessControlPolicy = from_xml(xml).unwrap();
        assert_eq!(
            policy.owner.as_ref().and_then(|o| o.display_name.as_deref()),
            Some("owner")
        );
        assert_eq!(policy.grants.len(), 2);
        let group = policy.grants[1].grantee.as_ref().unwrap();
        assert_eq!(group.r#type, GranteeType::Group);
        assert_eq!(
            group.uri.as_deref(),
            Some("http://acs.amazonaws.com/groups/global/AllUsers")
        );
        assert_eq!(policy.grants[1].permission, Some(Permission::Read));
    }

    #[test]
    fn test_should_reject_unknown_permission() {
        let xml = b"<AccessControlPolicy><AccessControlList><Grant>\
            <Permission>EVERYTHING</Permission></Grant></AccessControlList></AccessControlPolicy>";
        let result: Result<AccessControlPolicy, _> = from_xml(xml);
        assert!(matches!(result, Err(XmlError::ParseError(_))));
    }

    #[test]
    fn test_should_parse_multi_object_delete() {
        let xml = b"<Delete><Quiet>true</Quiet>\
            <Object><Key>a.txt</Key></Object>\
            <Object><Key>b.txt</Key><VersionId>v1</VersionId></Object></Delete>";
        let delete: Delete = from_xml(xml).unwrap();
        assert!(delete.quiet);
        assert_eq!(delete.objects.len(), 2);
        assert_eq!(delete.objects[1].version_id.as_deref(), Some("v1"));
    }

    #[test]
    fn test_should_require_key_for_delete_object() {
        let result: Result<Delete, _> = from_xml(b"<Delete><Object></Object></Delete>");
        assert!(matches!(result, Err(XmlError::MissingElement(_))));
    }

    #[test]
    fn test_should_parse_complete_multipart_upload() {
        let xml = b"<CompleteMultipartUpload>\
            <Part><PartNumber>1</PartNumber><ETag>\"a\"</ETag></Part>\
            <Part><PartNumber>2</PartNumber><ETag>\"b\"</ETag></Part>\
            </CompleteMultipartUpload>";
        let upload: CompletedMultipartUpload = from_xml(xml).unwrap();
        assert_eq!(upload.parts.len(), 2);
        assert_eq!(upload.parts[1].part_number, 2);
        assert_eq!(upload.parts[0].e_tag, "\"a\"");
    }

    #[test]
    fn test_should_unescape_entities_in_text() {
        let xml = b"<Tagging><TagSet><Tag><Key>a&amp;b</Key><Value>&lt;1&gt;</Value></Tag></TagSet></Tagging>";
        let tagging: Tagging = from_xml(xml).unwrap();
        assert_eq!(tagging.tag_set[0].key, "a&b");
        assert_eq!(tagging.tag_set[0].value, "<1>");
    }

    #[test]
    fn test_should_skip_unknown_elements() {
        let xml = b"<VersioningConfiguration><Extra><Nested>x</Nested></Extra>\
            <Status>Suspended</Status></VersioningConfiguration>";
        let config: VersioningConfiguration = from_xml(xml).unwrap();
        assert_eq!(config.status, Some(BucketVersioningStatus::Suspended));
    }

    #[test]
    fn test_should_parse_website_configuration_with_routing_rules() {
        let xml = b"<WebsiteConfiguration>\
            <IndexDocument><Suffix>index.html</Suffix></IndexDocument>\
            <ErrorDocument><Key>error.html</Key></ErrorDocument>\
            <RoutingRules><RoutingRule>\
              <Condition><KeyPrefixEquals>docs/</KeyPrefixEquals></Condition>\
              <Redirect><ReplaceKeyPrefixWith>documents/</ReplaceKeyPrefixWith></Redirect>\
            </RoutingRule></RoutingRules></WebsiteConfiguration>";
        let config: WebsiteConfiguration = from_xml(xml).unwrap();
        assert_eq!(config.index_document.unwrap().suffix, "index.html");
        assert_eq!(config.error_document.unwrap().key, "error.html");
        let rule = &config.routing_rules[0];
        assert_eq!(
            rule.condition.as_ref().and_then(|c| c.key_prefix_equals.as_deref()),
            Some("docs/")
        );
        assert_eq!(
            rule.redirect.replace_key_prefix_with.as_deref(),
            Some("documents/")
        );
    }

    #[test]
    fn test_should_parse_retention_and_legal_hold() {
        let retention: ObjectLockRetention = from_xml(
            b"<Retention><Mode>COMPLIANCE</Mode>\
              <RetainUntilDate>2030-01-01T00:00:00.000Z</RetainUntilDate></Retention>",
        )
        .unwrap();
        assert_eq!(retention.mode, Some(ObjectLockRetentionMode::Compliance));
        assert!(retention.retain_until_date.is_some());

        let hold: ObjectLockLegalHold =
            from_xml(b"<LegalHold><Status>ON</Status></LegalHold>").unwrap();
        assert_eq!(hold.status, Some(ObjectLockLegalHoldStatus::On));
    }

    #[test]
    fn test_should_treat_empty_location_constraint_as_none() {
        let config: CreateBucketConfiguration = from_xml(
            b"<CreateBucketConfiguration><LocationConstraint></LocationConstraint></CreateBucketConfiguration>",
        )
        .unwrap();
        assert_eq!(config.location_constraint, None);
    }

    #[test]
    fn test_should_fail_on_empty_or_truncated_body() {
        assert!(matches!(
            from_xml::<Tagging>(b""),
            Err(XmlError::MissingElement(_))
        ));
        assert!(from_xml::<Tagging>(b"<Tagging><TagSet>").is_err());
    }

    #[test]
    fn test_should_read_back_written_logging_status() {
        let status = BucketLoggingStatus {
            logging_enabled: Some(LoggingEnabled {
                target_bucket: "logs".to_owned(),
                target_prefix: "access/".to_owned(),
                target_grants: Vec::new(),
            }),
        };
        let xml = to_xml("BucketLoggingStatus", &status).unwrap();
        let parsed: BucketLoggingStatus = from_xml(&xml).unwrap();
        assert_eq!(parsed, status);
    }
}
