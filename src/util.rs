use std::sync::Arc;

use openssl::x509::X509;

use crate::{
    config::IpnConfig,
    data::{
        datasources::{
            certificate_validator::CertificateValidator,
            signing_certificate_datasource::{
                CertificateCache, CertificateFetcher, HttpCertificateFetcher,
                MokaCertificateCache, SigningCertificateDatasourceImpl,
            },
        },
        repositories::ipn_repository_impl::IpnRepositoryImpl,
    },
    domain::{
        entities::{ipn_headers::IpnHeaders, verified_ipn_notification::VerifiedIpnNotification},
        repositories::ipn_repository::IpnRepository,
    },
    errors::IpnError,
};

/// Roots a signing certificate must chain to.
#[derive(Debug, Clone)]
pub enum TrustAnchors {
    /// The platform's default CA store.
    System,
    /// Only these certificates.
    Custom(Vec<X509>),
}

pub type DefaultIpnUtil = IpnUtil<IpnRepositoryImpl<SigningCertificateDatasourceImpl>>;

pub struct IpnUtil<R: IpnRepository> {
    ipn_repository: R,
}

impl<R: IpnRepository> IpnUtil<R> {
    pub fn from_repository(ipn_repository: R) -> Self {
        Self { ipn_repository }
    }

    /// Authenticates an IPN delivery. Render the result with
    /// [`VerifiedIpnNotification::to_json`], [`VerifiedIpnNotification::to_xml`]
    /// or [`VerifiedIpnNotification::to_map`].
    ///
    /// On error the endpoint should answer with a failure status so the
    /// delivery is retried by the publisher.
    pub async fn verify(
        &self,
        headers: &IpnHeaders,
        body: &str,
    ) -> Result<VerifiedIpnNotification, IpnError> {
        self.ipn_repository.verify_notification(headers, body).await
    }
}

impl DefaultIpnUtil {
    /// System trust roots, an in-process certificate cache, and HTTPS
    /// certificate downloads.
    pub fn new(config: &IpnConfig) -> Result<Self, IpnError> {
        let cache = Arc::new(MokaCertificateCache::new(
            config.certificate_cache_ttl(),
            config.certificate_cache_capacity,
        ));
        let fetcher = Arc::new(HttpCertificateFetcher::new(
            config.certificate_fetch_timeout(),
        )?);
        Self::with_components(config, TrustAnchors::System, cache, fetcher)
    }

    /// Like [`Self::new`], but with caller-provided trust roots, cache and
    /// fetcher. Pass the same cache to every instance to share downloaded
    /// certificates between them.
    pub fn with_components(
        config: &IpnConfig,
        trust_anchors: TrustAnchors,
        cache: Arc<dyn CertificateCache>,
        fetcher: Arc<dyn CertificateFetcher>,
    ) -> Result<Self, IpnError> {
        let certificate_validator = match &trust_anchors {
            TrustAnchors::System => {
                CertificateValidator::with_system_roots(&config.expected_common_name)?
            }
            TrustAnchors::Custom(anchors) => {
                CertificateValidator::with_trust_anchors(anchors, &config.expected_common_name)?
            }
        };
        Ok(Self {
            ipn_repository: IpnRepositoryImpl::new(
                SigningCertificateDatasourceImpl::new(cache, fetcher),
                certificate_validator,
                &config.message_type_header,
            ),
        })
    }
}
