use thiserror::Error;

/// Errors raised while verifying or rendering an IPN delivery.
///
/// None of these are retried or logged by this crate. The receiving endpoint
/// should answer the delivery with a failure status so the publisher's own
/// retry policy kicks in.
#[derive(Debug, Error)]
pub enum IpnError {
    #[error("Missing header '{0}'.")]
    MissingHeader(String),
    #[error("Header '{header}' has unexpected value '{value}'.")]
    UnexpectedHeaderValue { header: String, value: String },

    #[error("Notification payload is not valid JSON: {0}")]
    MalformedPayload(String),
    #[error("Notification is missing mandatory field '{0}'.")]
    MissingField(String),
    #[error("Field '{field}' is not a valid timestamp: '{value}'.")]
    InvalidTimestamp { field: String, value: String },
    #[error("Notification has unexpected message type '{0}'.")]
    UnexpectedMessageType(String),

    #[error("Signature version '{0}' is not supported.")]
    UnsupportedSignatureVersion(String),

    #[error("Failed to fetch signing certificate from '{url}': {reason}")]
    CertificateFetchFailed { url: String, reason: String },
    #[error("Signing certificate is not trusted: {0}")]
    UntrustedCertificate(String),
    #[error("Notification signature does not match its contents.")]
    SignatureMismatch,
    #[error("Signature is not valid base64: {0}")]
    DecodingError(String),

    #[error("Failed to decode notification data: {0}")]
    MalformedNotificationData(String),
    #[error("Invalid IPN configuration: {0}")]
    Configuration(String),
}

impl IpnError {
    /// Whether the failure came from an external collaborator rather than the
    /// notification itself. A redelivery of the same notification may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, IpnError::CertificateFetchFailed { .. })
    }
}
