use async_trait::async_trait;

use crate::{
    constants::{fields, SUPPORTED_SIGNATURE_VERSION},
    data::{
        datasources::{
            certificate_validator::CertificateValidator,
            signing_certificate_datasource::SigningCertificateDatasource,
            utils::{build_canonical_string, decode_signature, verify_signature},
        },
        models::sns_notifications::sns_message_model::{
            validate_message_type_header, SnsMessageModel,
        },
    },
    domain::{
        entities::{
            ipn_headers::IpnHeaders, verification_stage::VerificationStage,
            verified_ipn_notification::VerifiedIpnNotification,
        },
        repositories::ipn_repository::IpnRepository,
    },
    errors::IpnError,
};

pub struct IpnRepositoryImpl<D: SigningCertificateDatasource> {
    signing_certificate_datasource: D,
    certificate_validator: CertificateValidator,
    message_type_header: String,
}

#[async_trait]
impl<D: SigningCertificateDatasource> IpnRepository for IpnRepositoryImpl<D> {
    async fn verify_notification(
        &self,
        headers: &IpnHeaders,
        body: &str,
    ) -> Result<VerifiedIpnNotification, IpnError> {
        let mut stage = VerificationStage::Unverified;

        validate_message_type_header(headers, &self.message_type_header)?;
        let msg = SnsMessageModel::parse(body)?;
        let message_id = msg.get_mandatory_field(fields::MESSAGE_ID)?.into_owned();
        advance(&mut stage, &message_id);

        msg.validate_message_type()?;
        advance(&mut stage, &message_id);

        // Cheap checks before any network access.
        let signature_version = msg.get_mandatory_field(fields::SIGNATURE_VERSION)?;
        if signature_version != SUPPORTED_SIGNATURE_VERSION {
            return Err(IpnError::UnsupportedSignatureVersion(
                signature_version.into_owned(),
            ));
        }
        let canonical = build_canonical_string(&msg)?;
        let signature = decode_signature(&msg.get_mandatory_field(fields::SIGNATURE)?)?;
        let cert_url = msg.get_mandatory_field(fields::SIGNING_CERT_URL)?;

        let certificate = self
            .signing_certificate_datasource
            .get_certificate(&cert_url, &self.certificate_validator)
            .await?;
        advance(&mut stage, &message_id);

        if !self.certificate_validator.verify_chain(&certificate) {
            return Err(IpnError::UntrustedCertificate(format!(
                "certificate from '{}' does not chain to a trusted root",
                certificate.url()
            )));
        }
        advance(&mut stage, &message_id);

        if !self.certificate_validator.verify_subject(&certificate) {
            return Err(IpnError::UntrustedCertificate(format!(
                "certificate from '{}' was not issued to the expected publisher",
                certificate.url()
            )));
        }
        advance(&mut stage, &message_id);

        let public_key = certificate.public_key()?;
        if !verify_signature(&canonical, &signature, &public_key)? {
            return Err(IpnError::SignatureMismatch);
        }
        advance(&mut stage, &message_id);

        Ok(VerifiedIpnNotification {
            message_id,
            topic_arn: msg.get_mandatory_field(fields::TOPIC_ARN)?.into_owned(),
            subject: msg.get_optional_field(fields::SUBJECT).map(|s| s.into_owned()),
            timestamp: msg.get_mandatory_field_as_timestamp(fields::TIMESTAMP)?,
            message: msg.get_mandatory_field(fields::MESSAGE)?.into_owned(),
        })
    }
}

impl<D: SigningCertificateDatasource> IpnRepositoryImpl<D> {
    pub(crate) fn new(
        signing_certificate_datasource: D,
        certificate_validator: CertificateValidator,
        message_type_header: &str,
    ) -> Self {
        Self {
            signing_certificate_datasource,
            certificate_validator,
            message_type_header: message_type_header.to_owned(),
        }
    }
}

fn advance(stage: &mut VerificationStage, message_id: &str) {
    if let Some(next) = stage.next() {
        tracing::debug!(stage = ?next, message_id, "IPN verification advanced");
        *stage = next;
    }
}
