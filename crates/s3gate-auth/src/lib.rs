//! Request signature detection and AWS Signature Version 4 verification.
//!
//! [`RequestSignature::detect`] classifies a request as anonymous, SigV2,
//! SigV4 (header or presigned URL) or malformed. [`authenticate`] then checks
//! it against a secret key. Only SigV4 can succeed; everything else is
//! rejected with an [`AuthError`] describing why.
//!
//! ```rust
//! use s3gate_auth::{AuthError, RequestSignature, SignedRequest, authenticate};
//!
//! let headers = http::HeaderMap::new();
//! let request = SignedRequest { method: "GET", path: "/", query: "", headers: &headers };
//! let signature = RequestSignature::detect(&headers, None);
//! let result = authenticate(&signature, &request, |_| Some("secret".to_owned()), "UNSIGNED-PAYLOAD");
//! assert_eq!(result, Err(AuthError::MissingSignature));
//! ```

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod signature;
pub mod sigv4;

pub use credentials::{CredentialProvider, StaticCredentialProvider};
pub use error::AuthError;
pub use signature::{RequestSignature, SigV4Location, SigV4Params, SignatureVersion};
pub use sigv4::{AuthResult, PayloadHash, SignedRequest, hash_payload, verify_sigv4};

/// Verify a detected signature.
///
/// `secret_for` resolves the secret of the signing access key; `None` means
/// the key is unknown. `payload_hash` is only used for header signatures.
pub fn authenticate(
    signature: &RequestSignature,
    request: &SignedRequest<'_>,
    secret_for: impl FnOnce(&str) -> Option<String>,
    payload_hash: &str,
) -> Result<AuthResult, AuthError> {
    let params = signature.sigv4()?;
    let secret = secret_for(&params.access_key_id)
        .ok_or_else(|| AuthError::SecretNotFound(params.access_key_id.clone()))?;
    verify_sigv4(request, params, &secret, payload_hash)
}
