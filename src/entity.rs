//! Read-only certificate entity handed to projections.

use std::fmt;

use bon::bon;
use time::OffsetDateTime;
use url::Url;

use crate::cert::params::CertificateGenerationInput;
use crate::error::{Result, VaultError};

/// Identity of one certificate version: `{vault}/certificates/{name}/{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateId {
    vault: Url,
    name: String,
    version: String,
}

impl CertificateId {
    /// Builds an identity. The vault must be an absolute `http(s)` URL; name and
    /// version must be non-empty and free of `/`.
    pub fn new(vault: &str, name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let vault = parse_vault_url(vault)?;
        let name = name.into();
        let version = version.into();
        validate_segment(&name, "name")?;
        validate_segment(&version, "version")?;
        Ok(Self {
            vault,
            name,
            version,
        })
    }

    pub fn vault(&self) -> &Url {
        &self.vault
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Versioned URI of the certificate under its own vault.
    pub fn as_uri(&self) -> String {
        format!("{}/certificates/{}/{}", base(&self.vault), self.name, self.version)
    }

    /// Policy URI of the certificate under `namespace`, which may be an alias
    /// of the owning vault.
    pub fn as_policy_uri(&self, namespace: &Url) -> String {
        format!("{}/certificates/{}/policy", base(namespace), self.name)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_uri())
    }
}

/// Parses an absolute `http`/`https` vault URL.
pub(crate) fn parse_vault_url(value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| VaultError::InvalidArgument(format!("Invalid vault URL '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(VaultError::InvalidArgument(format!(
            "Vault URL must be an absolute http(s) URL: {value}"
        )));
    }
    Ok(url)
}

fn base(url: &Url) -> &str {
    url.as_str().trim_end_matches('/')
}

fn validate_segment(value: &str, field: &str) -> Result<()> {
    if value.is_empty() || value.contains('/') {
        return Err(VaultError::InvalidArgument(format!(
            "Certificate {field} must be a non-empty path segment: {value:?}"
        )));
    }
    Ok(())
}

/// A certificate version as the projection sees it.
///
/// The entity owns exactly one generation input. Reads never change it; the
/// external lifecycle owner is the only writer and must serialize its writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntity {
    id: CertificateId,
    enabled: bool,
    created: OffsetDateTime,
    updated: OffsetDateTime,
    generator: CertificateGenerationInput,
}

#[bon]
impl CertificateEntity {
    #[builder]
    pub fn new(
        id: CertificateId,
        generator: CertificateGenerationInput,
        #[builder(default = true)] enabled: bool,
        #[builder(default = OffsetDateTime::now_utc())] created: OffsetDateTime,
        updated: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id,
            enabled,
            created,
            updated: updated.unwrap_or(created),
            generator,
        }
    }
}

impl CertificateEntity {
    pub fn id(&self) -> &CertificateId {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created(&self) -> OffsetDateTime {
        self.created
    }

    pub fn updated(&self) -> OffsetDateTime {
        self.updated
    }

    /// The generation input that produced this version.
    pub fn generator(&self) -> &CertificateGenerationInput {
        &self.generator
    }

    /// Attribute change made by the lifecycle owner; moves `updated` to `at`.
    pub fn set_enabled(&mut self, enabled: bool, at: OffsetDateTime) {
        self.enabled = enabled;
        self.updated = at;
    }
}
