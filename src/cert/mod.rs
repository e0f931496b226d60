pub mod extensions;
pub mod params;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use der::{Decode, DecodePem, Encode, EncodePem};
use extensions::ToAndFromX509Extension;
use params::{CertificateContentType, CertificateGenerationInput, ExtensionParam, Validity};
use sha1::{Digest, Sha1};
use tracing::debug;
use x509_cert::certificate::CertificateInner;

use crate::error::{Result, VaultError};
use crate::issuer::{CertAuthorityType, Issuer, SelfIssuer};
use crate::key::{KeyGenerator, KeyPair};
use crate::tbs_certificate::from_x509_time;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// RSA identifiers carry an explicit NULL parameter, ECDSA ones carry none.
    fn from(value: SignatureAlgorithm) -> Self {
        let (oid, parameters) = match value {
            SignatureAlgorithm::Sha256WithRSA => (
                const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                Some(der::asn1::AnyRef::NULL.into()),
            ),
            SignatureAlgorithm::Sha256WithECDSA => (const_oid::db::rfc5912::ECDSA_WITH_SHA_256, None),
            SignatureAlgorithm::Sha384WithECDSA => (const_oid::db::rfc5912::ECDSA_WITH_SHA_384, None),
            SignatureAlgorithm::Sha512WithECDSA => (const_oid::db::rfc5912::ECDSA_WITH_SHA_512, None),
        };
        x509_cert::spki::AlgorithmIdentifierOwned { oid, parameters }
    }
}

/// Represents an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| VaultError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| VaultError::Encoding(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_pem(pem)?,
        })
    }

    /// Base64url (unpadded) SHA-1 thumbprint of the DER encoding, the `x5t`
    /// value vaults report for a certificate.
    pub fn thumbprint(&self) -> Result<String> {
        let digest = Sha1::digest(self.to_der()?);
        Ok(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Subject in RFC 4514 form.
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }

    /// Raw extensions of the certificate.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// Decodes the extension of type `E`, if the certificate carries one.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(|ext| ext.to_extension())
            .transpose()
    }
}

/// Key material and (for locally signed authorities) the certificate produced
/// for one generation input.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub key: KeyPair,
    pub certificate: Option<Certificate>,
    pub content_type: CertificateContentType,
    /// Whether the private key may leave the vault with the secret.
    pub exportable: bool,
}

impl IssuedCertificate {
    /// Generates a key pair for `input` and, when the authority is `Self`,
    /// signs a certificate with it.
    pub fn generate(input: &CertificateGenerationInput, keys: &KeyGenerator) -> Result<Self> {
        let key = keys
            .generate(input.key_type(), Some(input.key_parameter()))?
            .into_key_pair()
            .ok_or_else(|| {
                VaultError::PolicyValidation(format!(
                    "Certificates need an asymmetric key, got {}",
                    input.key_type()
                ))
            })?;

        let certificate = match input.cert_authority_type() {
            CertAuthorityType::SelfSigned => {
                let issuer = SelfIssuer {
                    name: input.subject().as_x509_name(),
                    key: &key,
                };
                let validity = Validity::for_months(input.validity_months());
                Some(issuer.issue(input, &key, validity)?)
            }
            CertAuthorityType::Unknown => {
                debug!(
                    subject = %input.subject(),
                    "certificate left pending for an external authority"
                );
                None
            }
        };

        Ok(Self {
            key,
            certificate,
            content_type: input.content_type(),
            exportable: input.is_exportable_private_key(),
        })
    }

    /// Secret value in the policy's content type: the PKCS#8 private key
    /// followed by the certificate, both PEM encoded. A non-exportable key is
    /// left out and only the certificate is returned.
    pub fn secret_bundle(&self) -> Result<String> {
        if self.content_type != CertificateContentType::Pem {
            return Err(VaultError::Encoding(format!(
                "{} bundles are not supported",
                self.content_type.mime_type()
            )));
        }
        let certificate = self.certificate.as_ref().ok_or_else(|| {
            VaultError::Encoding("No certificate has been issued".to_string())
        })?;
        if !self.exportable {
            return certificate.to_pem();
        }
        let key = self.key.to_pkcs8_pem()?;
        Ok(format!("{}{}", key.as_str(), certificate.to_pem()?))
    }
}
