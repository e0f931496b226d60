use std::str::FromStr;

use der::Encode;
use der::flagset::FlagSet;
use serde::Serialize;
use tracing::debug;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, KeyUsages,
    SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{CertificateGenerationInput, ExtensionParam, Validity};
use crate::error::{Result, VaultError};
use crate::key::KeyPair;
use crate::pki;
use crate::tbs_certificate::TbsCertificate;

/// Simulated certificate authority named by a certificate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CertAuthorityType {
    /// The certificate is signed with its own key.
    #[default]
    #[serde(rename = "Self")]
    SelfSigned,
    /// Issuance is left to an external authority; nothing is signed locally.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CertAuthorityType {
    pub const fn as_str(self) -> &'static str {
        match self {
            CertAuthorityType::SelfSigned => "Self",
            CertAuthorityType::Unknown => "Unknown",
        }
    }
}

impl FromStr for CertAuthorityType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Self" => Ok(CertAuthorityType::SelfSigned),
            "Unknown" => Ok(CertAuthorityType::Unknown),
            other => Err(VaultError::PolicyValidation(format!(
                "Unknown certificate authority: {other}"
            ))),
        }
    }
}

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the serial number for the next certificate.
    fn serial_number(&self) -> Vec<u8>;

    /// Issues a certificate for `subject_key` shaped by the policy in `input`.
    fn issue(
        &self,
        input: &CertificateGenerationInput,
        subject_key: &KeyPair,
        validity: Validity,
    ) -> Result<Certificate> {
        let signature_algorithm = pki::signature_algorithm(self.signing_key());

        let issuer_spki = self.signing_key().as_spki()?;
        let subject_spki = subject_key.as_spki()?;

        let mut extensions = vec![
            ExtensionParam::from_extension(
                &BasicConstraints {
                    is_ca: false,
                    max_path_length: None,
                },
                true,
            )?,
            ExtensionParam::from_extension(
                &SubjectKeyIdentifier(pki::key_identifier(&subject_spki)),
                false,
            )?,
            ExtensionParam::from_extension(
                &AuthorityKeyIdentifier {
                    key_identifier: pki::key_identifier(&issuer_spki),
                },
                false,
            )?,
        ];

        let key_usage_flags = input
            .key_usage()
            .iter()
            .fold(FlagSet::<KeyUsages>::empty(), |flags, usage| {
                flags | KeyUsages::from(*usage)
            });
        if !key_usage_flags.is_empty() {
            extensions.push(ExtensionParam::from_extension(
                &KeyUsage(key_usage_flags),
                true,
            )?);
        }

        if !input.extended_key_usage().is_empty() {
            extensions.push(ExtensionParam::from_extension(
                &ExtendedKeyUsage {
                    usage: input.extended_key_usage().to_vec(),
                },
                false,
            )?);
        }

        let sans = input.subject_alternative_names();
        if !sans.is_empty() {
            let san = SubjectAltName {
                dns_names: sans.dns_names.clone(),
                emails: sans.emails.clone(),
                ips: sans.ip_addresses()?,
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }

        let tbs_cert = TbsCertificate {
            serial_number: self.serial_number(),
            signature_algorithm: signature_algorithm.clone(),
            issuer: self.issuer_name().clone(),
            validity,
            subject: input.subject().as_x509_name().clone(),
            subject_public_key_info: subject_spki,
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = pki::sign_data(&tbs_cert_inner.to_der()?, self.signing_key())?;

        debug!(
            subject = %input.subject(),
            algorithm = ?signature_algorithm,
            "issued certificate"
        );

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Issuer of self-signed certificates: the issuer name is the subject and the
/// signing key is the subject's own key.
pub struct SelfIssuer<'a> {
    pub name: &'a Name,
    pub key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> &Name {
        self.name
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    /// Random positive 128-bit serial number.
    fn serial_number(&self) -> Vec<u8> {
        let mut serial: [u8; 16] = rand::random();
        serial[0] = (serial[0] & 0x7f) | 0x01;
        serial.to_vec()
    }
}
