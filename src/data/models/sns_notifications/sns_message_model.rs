use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    constants::{fields, NOTIFICATION_MESSAGE_TYPE},
    domain::entities::ipn_headers::IpnHeaders,
    errors::IpnError,
};

/// Top-level SNS envelope of an IPN delivery, as a typed view over the
/// decoded JSON body.
///
/// https://docs.aws.amazon.com/sns/latest/dg/sns-message-and-json-formats.html
///
/// Field names are case-sensitive. All lookups go through the accessors below
/// so that a missing mandatory field is reported the same way everywhere.
#[derive(Debug, Clone)]
pub(crate) struct SnsMessageModel {
    fields: Map<String, Value>,
}

impl SnsMessageModel {
    pub(crate) fn parse(body: &str) -> Result<Self, IpnError> {
        match serde_json::from_str(body) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) => Err(IpnError::MalformedPayload(
                "expected a JSON object at the top level".to_owned(),
            )),
            Err(e) => Err(IpnError::MalformedPayload(e.to_string())),
        }
    }

    /// Requires `Type` to be `Notification` (case-insensitive).
    pub(crate) fn validate_message_type(&self) -> Result<(), IpnError> {
        let message_type = self.get_mandatory_field(fields::TYPE)?;
        if message_type.eq_ignore_ascii_case(NOTIFICATION_MESSAGE_TYPE) {
            Ok(())
        } else {
            Err(IpnError::UnexpectedMessageType(message_type.into_owned()))
        }
    }

    pub(crate) fn get_mandatory_field(&self, name: &str) -> Result<Cow<'_, str>, IpnError> {
        self.get_optional_field(name)
            .ok_or_else(|| IpnError::MissingField(name.to_owned()))
    }

    pub(crate) fn get_mandatory_field_as_timestamp(
        &self,
        name: &str,
    ) -> Result<DateTime<Utc>, IpnError> {
        let raw = self.get_mandatory_field(name)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|_| IpnError::InvalidTimestamp {
                field: name.to_owned(),
                value: raw.into_owned(),
            })
    }

    /// Scalars only; `null` and nested objects/arrays count as absent.
    pub(crate) fn get_optional_field(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.fields.get(name)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Requires the message type header to be present and equal to
/// `Notification` (case-insensitive).
pub(crate) fn validate_message_type_header(
    headers: &IpnHeaders,
    header_name: &str,
) -> Result<(), IpnError> {
    let value = headers
        .get(header_name)
        .ok_or_else(|| IpnError::MissingHeader(header_name.to_owned()))?;
    if value.trim().eq_ignore_ascii_case(NOTIFICATION_MESSAGE_TYPE) {
        Ok(())
    } else {
        Err(IpnError::UnexpectedHeaderValue {
            header: header_name.to_owned(),
            value: value.to_owned(),
        })
    }
}
