pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod certificate_validator;
        pub(crate) mod signing_certificate_datasource;
        pub(crate) mod utils;
    }
    pub(crate) mod models {
        pub(crate) mod sns_notifications {
            pub(crate) mod ipn_message_model;
            pub(crate) mod sns_message_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod ipn_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod ipn_headers;
        pub(crate) mod notification_data;
        pub mod signing_certificate;
        pub mod verification_stage;
        pub mod verified_ipn_notification;
    }
    pub mod repositories {
        pub mod ipn_repository;
    }
}

pub mod config;
pub mod constants;
pub mod errors;
pub mod util;

pub use data::datasources::{
    certificate_validator::{parse_subject_attributes, CertificateValidator},
    signing_certificate_datasource::{
        CertificateCache, CertificateFetcher, HttpCertificateFetcher, MokaCertificateCache,
    },
};
