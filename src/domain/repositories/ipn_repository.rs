use async_trait::async_trait;

use crate::{
    domain::entities::{
        ipn_headers::IpnHeaders, verified_ipn_notification::VerifiedIpnNotification,
    },
    errors::IpnError,
};

#[async_trait]
pub trait IpnRepository: Send + Sync {
    /// Authenticates a raw IPN delivery. Succeeds only if the headers, message
    /// type, signing certificate and signature all check out.
    async fn verify_notification(
        &self,
        headers: &IpnHeaders,
        body: &str,
    ) -> Result<VerifiedIpnNotification, IpnError>;
}
