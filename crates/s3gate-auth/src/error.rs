//! Error types for request authentication.
//!
//! Every failure mode of signature detection and verification is an
//! [`AuthError`]. The HTTP layer maps these onto S3 error codes.

/// Errors that can occur while authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request carries no signature at all.
    #[error("Request is not signed")]
    MissingSignature,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not one this engine understands.
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature Version 2 requests are not accepted.
    #[error("Signature Version 2 is not supported")]
    SignatureV2NotSupported,

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// No secret key is known for the access key.
    #[error("No secret key for access key: {0}")]
    SecretNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The presigned URL has expired.
    #[error("Request has expired")]
    RequestExpired,

    /// A required presigned URL query parameter is missing or invalid.
    #[error("Missing or invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// `x-amz-content-sha256` is malformed or does not match the body.
    #[error("x-amz-content-sha256 mismatch: {0}")]
    ContentSha256Mismatch(String),
}
