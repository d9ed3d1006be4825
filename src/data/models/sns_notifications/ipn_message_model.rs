use serde::Deserialize;

use crate::errors::IpnError;

/// Data structure carried (JSON-serialized) in the `Message` field of an IPN
/// delivery.
///
/// Only the fields used downstream are modeled; anything else in the message
/// is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct IpnMessageModel {
    /// Unique identifier of the notification. Use this value to identify a
    /// duplicate delivery.
    pub(crate) notification_reference_id: String,
    /// Kind of payment event, e.g. "PaymentAuthorize".
    pub(crate) notification_type: String,
    /// Merchant the notification is addressed to.
    pub(crate) seller_id: String,
    /// "Sandbox" or "Live".
    pub(crate) release_environment: String,
    /// The event details, as XML text.
    pub(crate) notification_data: String,
}

impl IpnMessageModel {
    pub(crate) fn parse(message: &str) -> Result<Self, IpnError> {
        serde_json::from_str(message).map_err(|e| {
            IpnError::MalformedNotificationData(format!("failed to parse Message field: {e}"))
        })
    }
}
