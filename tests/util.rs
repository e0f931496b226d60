#![allow(dead_code)]

use time::macros::datetime;
use vaultkit::cert::params::{CertificateContentType, CertificateGenerationInput};
use vaultkit::entity::{CertificateEntity, CertificateId};
use vaultkit::key::{KeyCurveName, KeyType};

pub const VAULT: &str = "https://localhost:8443";

/// Routes `tracing` output through the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn ec_policy(curve: KeyCurveName, subject: &str) -> CertificateGenerationInput {
    CertificateGenerationInput::builder()
        .key_type(KeyType::Ec)
        .key_curve_name(curve)
        .subject(subject)
        .dns_names(vec!["localhost".to_string(), "vault.localhost".to_string()])
        .emails(vec!["admin@localhost".to_string()])
        .ips(vec!["127.0.0.1".to_string()])
        .extended_key_usage(vec!["1.3.6.1.5.5.7.3.1".to_string()])
        .content_type(CertificateContentType::Pem)
        .build()
        .unwrap()
}

pub fn rsa_policy(size: u32, subject: &str) -> CertificateGenerationInput {
    CertificateGenerationInput::builder()
        .key_type(KeyType::Rsa)
        .key_size(size)
        .subject(subject)
        .dns_names(vec!["localhost".to_string()])
        .content_type(CertificateContentType::Pem)
        .validity_months(24)
        .build()
        .unwrap()
}

pub fn entity(name: &str, policy: CertificateGenerationInput) -> CertificateEntity {
    CertificateEntity::builder()
        .id(CertificateId::new(VAULT, name, "00000000000000000000000000000001").unwrap())
        .generator(policy)
        .created(datetime!(2024-06-01 00:00:00 UTC))
        .build()
}
