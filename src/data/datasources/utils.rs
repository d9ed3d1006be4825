use base64::{prelude::BASE64_STANDARD, Engine as _};
use openssl::{
    hash::MessageDigest,
    pkey::{PKeyRef, Public},
    sign::Verifier,
};

use crate::{
    constants::{fields, CANONICAL_TIMESTAMP_FORMAT},
    data::models::sns_notifications::sns_message_model::SnsMessageModel,
    errors::IpnError,
};

/// Builds the exact byte string the publisher signed: for each field in fixed
/// order, the field name, a newline, the value, and a newline. `Subject` is
/// skipped entirely when absent; every other field is mandatory.
///
/// https://docs.aws.amazon.com/sns/latest/dg/sns-verify-signature-of-message.html
pub(crate) fn build_canonical_string(msg: &SnsMessageModel) -> Result<Vec<u8>, IpnError> {
    let message = msg.get_mandatory_field(fields::MESSAGE)?;
    let message_id = msg.get_mandatory_field(fields::MESSAGE_ID)?;
    let subject = msg.get_optional_field(fields::SUBJECT);
    let timestamp = msg
        .get_mandatory_field_as_timestamp(fields::TIMESTAMP)?
        .format(CANONICAL_TIMESTAMP_FORMAT)
        .to_string();
    let topic_arn = msg.get_mandatory_field(fields::TOPIC_ARN)?;
    let message_type = msg.get_mandatory_field(fields::TYPE)?;

    let mut canonical = Vec::with_capacity(message.len() + 256);
    let mut push = |name: &str, value: &str| {
        canonical.extend_from_slice(name.as_bytes());
        canonical.push(b'\n');
        canonical.extend_from_slice(value.as_bytes());
        canonical.push(b'\n');
    };
    push(fields::MESSAGE, &message);
    push(fields::MESSAGE_ID, &message_id);
    if let Some(subject) = subject.as_deref() {
        push(fields::SUBJECT, subject);
    }
    push(fields::TIMESTAMP, &timestamp);
    push(fields::TOPIC_ARN, &topic_arn);
    push(fields::TYPE, &message_type);
    Ok(canonical)
}

pub(crate) fn decode_signature(signature: &str) -> Result<Vec<u8>, IpnError> {
    BASE64_STANDARD
        .decode(signature.trim())
        .map_err(|e| IpnError::DecodingError(e.to_string()))
}

/// Verifies a SHA1 / PKCS#1 v1.5 RSA signature. A signature that simply does
/// not match (including one of the wrong length) is `Ok(false)`, not an error.
pub(crate) fn verify_signature(
    canonical: &[u8],
    signature: &[u8],
    public_key: &PKeyRef<Public>,
) -> Result<bool, IpnError> {
    let mut verifier = Verifier::new(MessageDigest::sha1(), public_key)
        .map_err(|e| IpnError::UntrustedCertificate(format!("unusable public key: {e}")))?;
    if verifier.update(canonical).is_err() {
        return Ok(false);
    }
    Ok(verifier.verify(signature).unwrap_or(false))
}
