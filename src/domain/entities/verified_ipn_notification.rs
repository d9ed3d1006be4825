use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    constants::fields,
    data::models::sns_notifications::ipn_message_model::IpnMessageModel,
    domain::entities::notification_data::{append_root_children, xml_to_map},
    errors::IpnError,
};

/// An IPN delivery whose signature, signing certificate and message type have
/// all been checked.
///
/// Only verification can produce this type, so the renderers below cannot be
/// reached with an unverified payload.
#[derive(Debug, Clone)]
pub struct VerifiedIpnNotification {
    pub(crate) message_id: String,
    pub(crate) topic_arn: String,
    pub(crate) subject: Option<String>,
    pub(crate) timestamp: DateTime<Utc>,
    /// The JSON text of the `Message` field, exactly as signed.
    pub(crate) message: String,
}

/// Business fields carried alongside the notification data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpnBusinessFields {
    pub notification_reference_id: String,
    pub notification_type: String,
    pub seller_id: String,
    pub release_environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum IpnNotificationType {
    PaymentAuthorize,
    PaymentCapture,
    PaymentRefund,
    OrderReferenceNotification,
    BillingAgreementNotification,
    ChargebackDetailedNotification,
    SolutionProviderEvent,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum ReleaseEnvironment {
    Sandbox,
    Live,

    #[serde(untagged)]
    Unknown(String),
}

impl IpnBusinessFields {
    pub fn notification_type(&self) -> IpnNotificationType {
        serde_json::from_value(Value::String(self.notification_type.clone()))
            .unwrap_or_else(|_| IpnNotificationType::Unknown(self.notification_type.clone()))
    }

    pub fn release_environment(&self) -> ReleaseEnvironment {
        serde_json::from_value(Value::String(self.release_environment.clone()))
            .unwrap_or_else(|_| ReleaseEnvironment::Unknown(self.release_environment.clone()))
    }

    fn as_pairs(&self) -> [(&'static str, &str); 4] {
        [
            (fields::NOTIFICATION_REFERENCE_ID, &self.notification_reference_id),
            (fields::NOTIFICATION_TYPE, &self.notification_type),
            (fields::SELLER_ID, &self.seller_id),
            (fields::RELEASE_ENVIRONMENT, &self.release_environment),
        ]
    }
}

impl VerifiedIpnNotification {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Decodes the four business fields from the `Message` field. Not cached;
    /// each call re-reads the message.
    pub fn business_fields(&self) -> Result<IpnBusinessFields, IpnError> {
        Ok(self.decode_message()?.0)
    }

    /// The raw `NotificationData` XML document.
    pub fn notification_data(&self) -> Result<String, IpnError> {
        Ok(self.decode_message()?.1)
    }

    /// The notification data as a map keyed by its root element name, with
    /// the four business fields added as top-level entries.
    pub fn to_map(&self) -> Result<Map<String, Value>, IpnError> {
        let (business_fields, notification_data) = self.decode_message()?;
        let mut map = xml_to_map(&notification_data)?;
        for (name, value) in business_fields.as_pairs() {
            map.insert(name.to_owned(), Value::String(value.to_owned()));
        }
        Ok(map)
    }

    /// Same content as [`Self::to_map`], serialized as JSON.
    pub fn to_json(&self) -> Result<String, IpnError> {
        serde_json::to_string(&self.to_map()?)
            .map_err(|e| IpnError::MalformedNotificationData(e.to_string()))
    }

    /// The notification data XML with the four business fields added as the
    /// last children of its root element.
    pub fn to_xml(&self) -> Result<String, IpnError> {
        let (business_fields, notification_data) = self.decode_message()?;
        append_root_children(&notification_data, &business_fields.as_pairs())
    }

    fn decode_message(&self) -> Result<(IpnBusinessFields, String), IpnError> {
        let m = IpnMessageModel::parse(&self.message)?;
        Ok((
            IpnBusinessFields {
                notification_reference_id: m.notification_reference_id,
                notification_type: m.notification_type,
                seller_id: m.seller_id,
                release_environment: m.release_environment,
            },
            m.notification_data,
        ))
    }
}
