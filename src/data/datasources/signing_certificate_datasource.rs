use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::sync::Cache;

use crate::{
    constants::{CERT_CACHE_NAMESPACE, CERT_MAX_BYTES},
    data::datasources::certificate_validator::CertificateValidator,
    domain::entities::signing_certificate::SigningCertificate,
    errors::IpnError,
};

/// Store for downloaded signing certificates, shared by every request that
/// references the same certificate URL. Implementations must be safe for
/// concurrent use and expire entries on their own.
pub trait CertificateCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<SigningCertificate>>;
    fn insert(&self, key: String, certificate: Arc<SigningCertificate>);
}

/// Default in-process cache. Entries expire a fixed time after insertion;
/// reads do not extend their lifetime.
pub struct MokaCertificateCache {
    cache: Cache<String, Arc<SigningCertificate>>,
}

impl MokaCertificateCache {
    pub fn new(time_to_live: Duration, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(time_to_live)
                .build(),
        }
    }
}

impl CertificateCache for MokaCertificateCache {
    fn get(&self, key: &str) -> Option<Arc<SigningCertificate>> {
        self.cache.get(key)
    }

    fn insert(&self, key: String, certificate: Arc<SigningCertificate>) {
        self.cache.insert(key, certificate);
    }
}

/// Retrieves the raw certificate bytes behind a `SigningCertURL`.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, IpnError>;
}

pub struct HttpCertificateFetcher {
    client: reqwest::Client,
}

impl HttpCertificateFetcher {
    pub fn new(timeout: Duration) -> Result<Self, IpnError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IpnError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CertificateFetcher for HttpCertificateFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, IpnError> {
        let fetch_error = |reason: String| IpnError::CertificateFetchFailed {
            url: url.to_owned(),
            reason,
        };
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(format!("request failed to send: {e}")))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!(
                "request returned with non-200 status code {}",
                response.status()
            )));
        }
        let too_large = || fetch_error(format!("certificate exceeds {CERT_MAX_BYTES} bytes"));
        if response
            .content_length()
            .is_some_and(|length| length > CERT_MAX_BYTES as u64)
        {
            return Err(too_large());
        }
        // Content-Length may be absent or wrong, so the cap also applies while
        // reading.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_error(format!("failed to read response body: {e}")))?
        {
            if body.len() + chunk.len() > CERT_MAX_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
pub trait SigningCertificateDatasource: Send + Sync {
    /// Returns the certificate behind `url`, downloading it on a cache miss.
    /// A downloaded certificate is only cached if `validator` accepts it.
    ///
    /// Concurrent misses for the same URL may each download the certificate;
    /// the last insert wins, which is harmless since the content is the same.
    async fn get_certificate(
        &self,
        url: &str,
        validator: &CertificateValidator,
    ) -> Result<Arc<SigningCertificate>, IpnError>;
}

pub struct SigningCertificateDatasourceImpl {
    cache: Arc<dyn CertificateCache>,
    fetcher: Arc<dyn CertificateFetcher>,
}

#[async_trait]
impl SigningCertificateDatasource for SigningCertificateDatasourceImpl {
    async fn get_certificate(
        &self,
        url: &str,
        validator: &CertificateValidator,
    ) -> Result<Arc<SigningCertificate>, IpnError> {
        let key = cache_key(url);
        if let Some(certificate) = self.cache.get(&key) {
            tracing::debug!(cert_url = url, "signing certificate cache hit");
            return Ok(certificate);
        }

        tracing::debug!(cert_url = url, "signing certificate cache miss, fetching");
        let bytes = self.fetcher.fetch(url).await?;
        let certificate = Arc::new(SigningCertificate::from_bytes(url, &bytes)?);
        if validator.verify_issued_by_publisher(&certificate) {
            self.cache.insert(key, Arc::clone(&certificate));
        } else {
            tracing::debug!(cert_url = url, "not caching rejected signing certificate");
        }
        Ok(certificate)
    }
}

impl SigningCertificateDatasourceImpl {
    pub fn new(cache: Arc<dyn CertificateCache>, fetcher: Arc<dyn CertificateFetcher>) -> Self {
        Self { cache, fetcher }
    }
}

pub(crate) fn cache_key(url: &str) -> String {
    format!("{CERT_CACHE_NAMESPACE}:{url}")
}
