use openssl::{
    pkey::{PKey, Public},
    x509::X509,
};

use crate::errors::IpnError;

/// The certificate a notification was signed with, as downloaded from its
/// `SigningCertURL`. Shared read-only between requests through the
/// certificate cache.
#[derive(Clone)]
pub struct SigningCertificate {
    url: String,
    leaf: X509,
    intermediates: Vec<X509>,
}

impl SigningCertificate {
    /// Accepts a PEM bundle (leaf first, then any intermediates) or a single
    /// DER certificate.
    pub fn from_bytes(url: &str, bytes: &[u8]) -> Result<Self, IpnError> {
        let parse_error = |reason: String| IpnError::CertificateFetchFailed {
            url: url.to_owned(),
            reason,
        };
        let mut certs = match X509::stack_from_pem(bytes) {
            Ok(certs) if !certs.is_empty() => certs,
            _ => vec![X509::from_der(bytes)
                .map_err(|e| parse_error(format!("not a PEM or DER certificate: {e}")))?],
        };
        let leaf = certs.remove(0);
        Ok(Self {
            url: url.to_owned(),
            leaf,
            intermediates: certs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn leaf(&self) -> &X509 {
        &self.leaf
    }

    pub fn intermediates(&self) -> &[X509] {
        &self.intermediates
    }

    pub fn public_key(&self) -> Result<PKey<Public>, IpnError> {
        self.leaf.public_key().map_err(|e| {
            IpnError::UntrustedCertificate(format!("certificate has no usable public key: {e}"))
        })
    }
}

impl std::fmt::Debug for SigningCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCertificate")
            .field("url", &self.url)
            .field("intermediates", &self.intermediates.len())
            .finish()
    }
}
