#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine as _};
use fractic_ipn::{
    config::IpnConfig,
    domain::entities::{ipn_headers::IpnHeaders, signing_certificate::SigningCertificate},
    errors::IpnError,
    util::{DefaultIpnUtil, TrustAnchors},
    CertificateCache, CertificateFetcher,
};
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Rsa,
    sign::Signer,
    x509::{
        extension::{BasicConstraints, KeyUsage},
        X509Builder, X509NameBuilder, X509,
    },
};
use serde_json::json;

pub const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:ipn-topic";
pub const TIMESTAMP: &str = "2021-01-01T00:00:00Z";

pub const AUTHORIZE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AuthorizationNotification xmlns="https://mws.amazonservices.com/ipn/OffAmazonPayments/2013-01-01">
    <AuthorizationDetails>
        <AmazonAuthorizationId>P01-1234567-1234567-0000001</AmazonAuthorizationId>
        <AuthorizationReferenceId>auth-ref-1</AuthorizationReferenceId>
        <AuthorizationAmount>
            <Amount>19.99</Amount>
            <CurrencyCode>USD</CurrencyCode>
        </AuthorizationAmount>
        <AuthorizationStatus>
            <State>Open</State>
        </AuthorizationStatus>
    </AuthorizationDetails>
</AuthorizationNotification>"#;

/// Throw-away PKI: a root CA and a signing certificate issued by it.
pub struct TestPki {
    pub root: X509,
    root_key: PKey<Private>,
}

impl TestPki {
    pub fn new() -> Self {
        let root_key = new_key();
        let name = build_name(&[("CN", "Fractic Test Root CA"), ("O", "Fractic Test")]);
        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&root_key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder.sign(&root_key, MessageDigest::sha256()).unwrap();
        Self {
            root: builder.build(),
            root_key,
        }
    }

    /// Issues a leaf certificate with the given subject attributes, most
    /// general first (C, ST, L, O, CN).
    pub fn issue<K: AsRef<str>, V: AsRef<str>>(&self, subject: &[(K, V)]) -> (X509, PKey<Private>) {
        let key = new_key();
        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(2).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&build_name(subject)).unwrap();
        builder.set_issuer_name(self.root.subject_name()).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(KeyUsage::new().digital_signature().build().unwrap())
            .unwrap();
        builder.sign(&self.root_key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }

    pub fn issue_publisher(&self) -> (X509, PKey<Private>) {
        self.issue(&publisher_subject("sns.amazonaws.com"))
    }
}

/// A certificate with the publisher's subject, issued by a root nobody
/// trusts.
pub fn untrusted_publisher() -> (X509, PKey<Private>) {
    TestPki::new().issue_publisher()
}

pub fn publisher_subject(cn: &str) -> Vec<(&'static str, String)> {
    vec![
        ("C", "US".to_owned()),
        ("ST", "Washington".to_owned()),
        ("L", "Seattle".to_owned()),
        ("O", "Amazon.com, Inc.".to_owned()),
        ("CN", cn.to_owned()),
    ]
}

fn new_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn build_name<K: AsRef<str>, V: AsRef<str>>(
    entries: &[(K, V)],
) -> openssl::x509::X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    for (key, value) in entries {
        name.append_entry_by_text(key.as_ref(), value.as_ref())
            .unwrap();
    }
    name.build()
}

/// Fields of an SNS notification envelope before signing.
#[derive(Clone)]
pub struct NotificationFixture {
    pub message_type: String,
    pub message_id: String,
    pub topic_arn: String,
    pub subject: Option<String>,
    pub timestamp: String,
    pub message: String,
    pub signature_version: String,
    pub signing_cert_url: String,
}

impl NotificationFixture {
    pub fn new(signing_cert_url: &str) -> Self {
        Self::with_data(signing_cert_url, AUTHORIZE_XML)
    }

    pub fn with_data(signing_cert_url: &str, notification_data: &str) -> Self {
        let message = json!({
            "NotificationReferenceId": "32d195c3-a829-4222-b1e2-14ab28909513",
            "MarketplaceID": "136872010",
            "NotificationType": "PaymentAuthorize",
            "SellerId": "A2Z8EXAMPLE",
            "ReleaseEnvironment": "Sandbox",
            "Version": "2013-01-01",
            "NotificationData": notification_data,
            "Timestamp": "2021-01-01T00:00:00Z"
        });
        Self {
            message_type: "Notification".to_owned(),
            message_id: "bf4a6cb3-6f7c-5d5f-8a3e-2b5e2a3c1d42".to_owned(),
            topic_arn: TOPIC_ARN.to_owned(),
            subject: None,
            timestamp: TIMESTAMP.to_owned(),
            message: message.to_string(),
            signature_version: "1".to_owned(),
            signing_cert_url: signing_cert_url.to_owned(),
        }
    }

    /// The string the publisher signs, written out independently of the
    /// library's own builder.
    pub fn canonical_string(&self) -> String {
        let mut canonical = format!(
            "Message\n{}\nMessageId\n{}\n",
            self.message, self.message_id
        );
        if let Some(subject) = &self.subject {
            canonical.push_str(&format!("Subject\n{subject}\n"));
        }
        canonical.push_str(&format!(
            "Timestamp\n2021-01-01T00:00:00.000Z\nTopicArn\n{}\nType\n{}\n",
            self.topic_arn, self.message_type
        ));
        canonical
    }

    pub fn sign(&self, key: &PKey<Private>) -> String {
        let mut signer = Signer::new(MessageDigest::sha1(), key).unwrap();
        signer.update(self.canonical_string().as_bytes()).unwrap();
        BASE64_STANDARD.encode(signer.sign_to_vec().unwrap())
    }

    pub fn body_with_signature(&self, signature: &str) -> String {
        let mut body = json!({
            "Type": self.message_type,
            "MessageId": self.message_id,
            "TopicArn": self.topic_arn,
            "Message": self.message,
            "Timestamp": self.timestamp,
            "SignatureVersion": self.signature_version,
            "Signature": signature,
            "SigningCertURL": self.signing_cert_url,
            "UnsubscribeURL": "https://sns.us-east-1.amazonaws.com/?Action=Unsubscribe"
        });
        if let Some(subject) = &self.subject {
            body["Subject"] = json!(subject);
        }
        body.to_string()
    }

    pub fn signed_body(&self, key: &PKey<Private>) -> String {
        self.body_with_signature(&self.sign(key))
    }
}

pub fn notification_headers() -> IpnHeaders {
    [
        ("x-amz-sns-message-type", "Notification"),
        ("x-amz-sns-message-id", "bf4a6cb3-6f7c-5d5f-8a3e-2b5e2a3c1d42"),
        ("Content-Type", "text/plain; charset=UTF-8"),
    ]
    .into_iter()
    .collect()
}

/// Cache fake that records lookups.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Arc<SigningCertificate>>>,
    pub hits: AtomicUsize,
}

impl InMemoryCache {
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl CertificateCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Arc<SigningCertificate>> {
        let found = self.entries.lock().unwrap().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        found
    }

    fn insert(&self, key: String, certificate: Arc<SigningCertificate>) {
        self.entries.lock().unwrap().insert(key, certificate);
    }
}

/// Fetcher fake serving a fixed certificate and counting calls.
pub struct StaticFetcher {
    pem: Vec<u8>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(certificate: &X509) -> Self {
        Self {
            pem: certificate.to_pem().unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, IpnError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pem.clone())
    }
}

pub fn ipn_util(
    pki: &TestPki,
    cache: Arc<dyn CertificateCache>,
    fetcher: Arc<dyn CertificateFetcher>,
) -> DefaultIpnUtil {
    DefaultIpnUtil::with_components(
        &IpnConfig::default(),
        TrustAnchors::Custom(vec![pki.root.clone()]),
        cache,
        fetcher,
    )
    .unwrap()
}
