//! XML error type and the S3 error document.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};
use s3gate_model::S3Error;

/// Errors raised while writing or reading S3 XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Writing to the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document is not well-formed.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A required element was absent.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// The document ended early or had an unexpected shape.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// Text content could not be converted to the field type.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

impl From<XmlError> for S3Error {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Io(_) => S3Error::internal_error(err.to_string()).with_source(err),
            _ => S3Error::malformed_xml(err.to_string()).with_source(err),
        }
    }
}

/// Write the S3 error document.
///
/// `Resource` is omitted when `resource` is `None`.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchKey</Code>
///   <Message>The specified key does not exist.</Message>
///   <Resource>/bucket/key</Resource>
///   <RequestId>4442587FB7D0A2F9</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn error_to_xml(
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, code, message, resource, request_id) {
        tracing::error!(error = %e, "failed to serialize S3 error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        crate::serialize::write_text_element(w, "Code", code)?;
        crate::serialize::write_text_element(w, "Message", message)?;
        crate::serialize::write_optional_text(w, "Resource", resource)?;
        crate::serialize::write_text_element(w, "RequestId", request_id)?;
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_write_error_document_with_resource() {
        let xml = error_to_xml(
            "NoSuchKey",
            "The specified key does not exist.",
            Some("/photos/cat.jpg"),
            "req-1",
        );
        let xml = String::from_utf8(xml).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>NoSuchKey</Code>\
             <Message>The specified key does not exist.</Message>\
             <Resource>/photos/cat.jpg</Resource>\
             <RequestId>req-1</RequestId></Error>"
        );
    }

    #[test]
    fn test_should_map_parse_failures_to_malformed_xml() {
        let err: S3Error = XmlError::MissingElement("Key".to_owned()).into();
        assert_eq!(err.code, s3gate_model::S3ErrorCode::MalformedXML);
        let err: S3Error = XmlError::Io(io::Error::other("disk")).into();
        assert_eq!(err.code, s3gate_model::S3ErrorCode::InternalError);
    }

    #[test]
    fn test_should_omit_resource_when_absent() {
        let xml = String::from_utf8(error_to_xml("InternalError", "boom", None, "r")).unwrap();
        assert!(!xml.contains("<Resource>"));
        assert!(xml.contains("<RequestId>r</RequestId>"));
    }

    #[test]
    fn test_should_escape_message_text() {
        let xml = String::from_utf8(error_to_xml(
            "InvalidArgument",
            "size must be < 5 & > 0",
            Some("/a&b"),
            "r",
        ))
        .unwrap();
        assert!(xml.contains("size must be &lt; 5 &amp; &gt; 0"));
        assert!(xml.contains("<Resource>/a&amp;b</Resource>"));
    }
}
