use std::collections::BTreeMap;

use openssl::{
    stack::Stack,
    x509::{
        store::{X509Store, X509StoreBuilder},
        X509NameRef, X509StoreContext, X509,
    },
};

use crate::{
    domain::entities::signing_certificate::SigningCertificate, errors::IpnError,
};

/// Decides whether a signing certificate really belongs to the publisher:
/// it must chain to a trusted root, and its subject CN must be the expected
/// one.
pub struct CertificateValidator {
    trust_store: X509Store,
    expected_common_name: String,
}

impl CertificateValidator {
    /// Trust the platform's default roots (the OpenSSL default CA paths).
    pub fn with_system_roots(expected_common_name: &str) -> Result<Self, IpnError> {
        let mut builder = X509StoreBuilder::new().map_err(config_error)?;
        builder.set_default_paths().map_err(config_error)?;
        Ok(Self {
            trust_store: builder.build(),
            expected_common_name: expected_common_name.to_owned(),
        })
    }

    /// Trust only the given roots.
    pub fn with_trust_anchors(
        anchors: &[X509],
        expected_common_name: &str,
    ) -> Result<Self, IpnError> {
        let mut builder = X509StoreBuilder::new().map_err(config_error)?;
        for anchor in anchors {
            builder.add_cert(anchor.clone()).map_err(config_error)?;
        }
        Ok(Self {
            trust_store: builder.build(),
            expected_common_name: expected_common_name.to_owned(),
        })
    }

    pub fn verify_issued_by_publisher(&self, cert: &SigningCertificate) -> bool {
        self.verify_chain(cert) && self.verify_subject(cert)
    }

    /// Standard path validation against the trust store, without revocation
    /// checks. Any OpenSSL failure counts as an invalid chain.
    pub fn verify_chain(&self, cert: &SigningCertificate) -> bool {
        let verify = || -> Result<bool, openssl::error::ErrorStack> {
            let mut intermediates = Stack::new()?;
            for intermediate in cert.intermediates() {
                intermediates.push(intermediate.clone())?;
            }
            let mut context = X509StoreContext::new()?;
            context.init(&self.trust_store, cert.leaf(), &intermediates, |c| {
                c.verify_cert()
            })
        };
        verify().unwrap_or(false)
    }

    pub fn verify_subject(&self, cert: &SigningCertificate) -> bool {
        let Some(subject) = render_subject(cert.leaf().subject_name()) else {
            return false;
        };
        match parse_subject_attributes(&subject) {
            Some(attributes) => {
                attributes.get("CN").map(String::as_str) == Some(self.expected_common_name.as_str())
            }
            None => false,
        }
    }
}

fn config_error(e: openssl::error::ErrorStack) -> IpnError {
    IpnError::Configuration(format!("failed to build certificate trust store: {e}"))
}

/// Renders a distinguished name as `KEY=value` pairs joined by `, `, most
/// specific attribute first (e.g. `CN=sns.amazonaws.com, O=Amazon.com, Inc.,
/// L=Seattle, ST=Washington, C=US`).
///
/// Values are taken from the raw entry bytes. `None` if any value is not
/// UTF-8 or contains a NUL byte, which C string handling would truncate.
pub(crate) fn render_subject(name: &X509NameRef) -> Option<String> {
    let mut parts = Vec::new();
    for entry in name.entries() {
        let key = entry
            .object()
            .nid()
            .short_name()
            .map(str::to_owned)
            .unwrap_or_else(|_| entry.object().to_string());
        let value = std::str::from_utf8(entry.data().as_slice()).ok()?;
        if value.contains('\0') {
            return None;
        }
        parts.push(format!("{key}={value}"));
    }
    parts.reverse();
    Some(parts.join(", "))
}

/// Parses a `KEY=value, KEY=value` subject string.
///
/// `, ` may also occur inside a value (`O=Amazon.com, Inc.`), so a segment
/// without `=` is glued back onto the previous one. Returns `None` if an
/// attribute key occurs twice, which is never legitimate here.
pub fn parse_subject_attributes(subject: &str) -> Option<BTreeMap<String, String>> {
    let mut segments: Vec<String> = Vec::new();
    for segment in subject.split(", ") {
        match segments.last_mut() {
            Some(previous) if !segment.contains('=') => {
                previous.push_str(", ");
                previous.push_str(segment);
            }
            _ => segments.push(segment.to_owned()),
        }
    }

    let mut attributes = BTreeMap::new();
    for segment in segments {
        let (key, value) = segment.split_once('=')?;
        if attributes
            .insert(key.trim().to_owned(), value.to_owned())
            .is_some()
        {
            return None;
        }
    }
    Some(attributes)
}
