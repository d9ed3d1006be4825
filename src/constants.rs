/// Header carrying the SNS message type of the delivery.
pub const MESSAGE_TYPE_HEADER: &str = "x-amz-sns-message-type";

/// Value of both the message type header and the `Type` field for IPN
/// deliveries (as opposed to subscription confirmations).
pub const NOTIFICATION_MESSAGE_TYPE: &str = "Notification";

/// Subject CN of the certificate the notification service signs with.
pub const EXPECTED_COMMON_NAME: &str = "sns.amazonaws.com";

pub const SUPPORTED_SIGNATURE_VERSION: &str = "1";

/// Prefix for certificate cache keys, so the cache can be shared with other
/// users keyed by URL.
pub const CERT_CACHE_NAMESPACE: &str = "fractic-ipn:signing-cert";

pub const CERT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const CERT_CACHE_CAPACITY: u64 = 64;
pub const CERT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Largest certificate download accepted, in bytes.
pub const CERT_MAX_BYTES: usize = 64 * 1024;

/// Timestamp format inside the canonical string: millisecond precision, UTC,
/// literal `Z`.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) mod fields {
    pub(crate) const TYPE: &str = "Type";
    pub(crate) const MESSAGE_ID: &str = "MessageId";
    pub(crate) const MESSAGE: &str = "Message";
    pub(crate) const SUBJECT: &str = "Subject";
    pub(crate) const TIMESTAMP: &str = "Timestamp";
    pub(crate) const TOPIC_ARN: &str = "TopicArn";
    pub(crate) const SIGNATURE_VERSION: &str = "SignatureVersion";
    pub(crate) const SIGNATURE: &str = "Signature";
    pub(crate) const SIGNING_CERT_URL: &str = "SigningCertURL";

    pub(crate) const NOTIFICATION_REFERENCE_ID: &str = "NotificationReferenceId";
    pub(crate) const NOTIFICATION_TYPE: &str = "NotificationType";
    pub(crate) const SELLER_ID: &str = "SellerId";
    pub(crate) const RELEASE_ENVIRONMENT: &str = "ReleaseEnvironment";
}
