//! Projection of a certificate entity into the policy model returned by the
//! vault API.
//!
//! Every view is rebuilt from the entity on each call, so converting the same
//! entity twice yields equal models and nothing is cached between calls.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::cert::params::{
    CertificateContentType, CertificateGenerationInput, KeyUsageType, SubjectAlternativeNames,
};
use crate::entity::{CertificateEntity, parse_vault_url};
use crate::error::{Result, VaultError};
use crate::issuer::CertAuthorityType;
use crate::key::{KeyCurveName, KeyType};

/// Certificate policy as exposed to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyModel {
    /// `{namespace}/certificates/{name}/policy`
    pub id: String,
    pub attributes: CertificatePropertiesView,
    pub issuer: IssuerView,
    pub key_props: KeyView,
    pub x509_props: X509View,
    pub secret_props: SecretView,
}

/// Lifecycle attributes; timestamps are Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CertificatePropertiesView {
    pub enabled: bool,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuerView {
    pub name: CertAuthorityType,
    /// Certificate type requested from the issuer. The emulator never sets one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    pub cert_transparency: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyView {
    pub exportable: bool,
    pub kty: KeyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<KeyCurveName>,
    pub reuse_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct X509View {
    pub subject: String,
    #[serde(skip_serializing_if = "SubjectAlternativeNames::is_empty")]
    pub sans: SubjectAlternativeNames,
    pub ekus: Vec<String>,
    pub key_usage: Vec<KeyUsageType>,
    pub validity_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecretView {
    #[serde(rename = "contentType")]
    pub content_type: CertificateContentType,
}

/// Stateless mapper from [`CertificateEntity`] to [`PolicyModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyModelConverter;

impl PolicyModelConverter {
    pub fn new() -> Self {
        Self
    }

    /// Projects `entity` into the policy model under `namespace`, the vault
    /// base URI the caller addressed.
    ///
    /// Fails with [`VaultError::InvalidArgument`] when the entity is absent or
    /// the namespace is not an absolute `http(s)` URL.
    pub fn convert(
        &self,
        entity: Option<&CertificateEntity>,
        namespace: &str,
    ) -> Result<PolicyModel> {
        let entity = entity.ok_or_else(|| {
            VaultError::InvalidArgument("Certificate entity must not be absent".to_string())
        })?;
        let namespace = parse_vault_url(namespace)?;
        let policy = entity.generator();

        debug!(certificate = %entity.id(), "converting certificate policy");

        Ok(PolicyModel {
            id: entity.id().as_policy_uri(&namespace),
            attributes: attributes_view(entity),
            issuer: issuer_view(policy),
            key_props: key_view(policy),
            x509_props: x509_view(policy),
            secret_props: secret_view(policy),
        })
    }
}

fn unix_seconds(value: OffsetDateTime) -> i64 {
    value.unix_timestamp()
}

fn attributes_view(entity: &CertificateEntity) -> CertificatePropertiesView {
    CertificatePropertiesView {
        enabled: entity.is_enabled(),
        created: unix_seconds(entity.created()),
        updated: unix_seconds(entity.updated()),
    }
}

fn issuer_view(policy: &CertificateGenerationInput) -> IssuerView {
    IssuerView {
        name: policy.cert_authority_type(),
        cty: None,
        cert_transparency: policy.is_enable_transparency(),
    }
}

fn key_view(policy: &CertificateGenerationInput) -> KeyView {
    KeyView {
        exportable: policy.is_exportable_private_key(),
        kty: policy.key_type(),
        key_size: policy.key_size(),
        crv: policy.key_curve_name(),
        reuse_key: policy.is_reuse_key_on_renewal(),
    }
}

fn x509_view(policy: &CertificateGenerationInput) -> X509View {
    X509View {
        subject: policy.subject().as_str().to_string(),
        sans: policy.subject_alternative_names().clone(),
        ekus: policy
            .extended_key_usage()
            .iter()
            .map(|oid| oid.to_string())
            .collect(),
        key_usage: policy.key_usage().to_vec(),
        validity_months: policy.validity_months(),
    }
}

fn secret_view(policy: &CertificateGenerationInput) -> SecretView {
    SecretView {
        content_type: policy.content_type(),
    }
}
