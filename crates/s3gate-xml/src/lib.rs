//! XML documents for the S3 REST protocol.
//!
//! - [`to_xml`] writes a response document for any [`S3Serialize`] type
//! - [`from_xml`] reads a request body into any [`S3Deserialize`] type
//! - [`error_to_xml`] writes the flat `<Error>` document
//!
//! Documents carry the `http://s3.amazonaws.com/doc/2006-03-01/` namespace,
//! booleans are `true`/`false` and timestamps look like
//! `2006-02-03T16:45:09.000Z`.

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, S3Serialize, format_timestamp, to_xml};
