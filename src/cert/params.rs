use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use bon::bon;
use const_oid::ObjectIdentifier;
use der::asn1::Ia5String;
use serde::Serialize;
use time::{Month, OffsetDateTime};
use x509_cert::ext::pkix::KeyUsages;
use x509_cert::name::{Name, RdnSequence};

use crate::error::{Result, VaultError};
use crate::issuer::CertAuthorityType;
use crate::key::{KeyCategory, KeyCurveName, KeyParameter, KeyPolicyConfig, KeyType};

use crate::cert::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsageOption;

/// Longest validity a policy may request, in months.
pub const MAX_VALIDITY_MONTHS: u32 = 1200;

/// Encoding of the certificate secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CertificateContentType {
    #[default]
    #[serde(rename = "application/x-pkcs12")]
    Pkcs12,
    #[serde(rename = "application/x-pem-file")]
    Pem,
}

impl CertificateContentType {
    pub const fn mime_type(self) -> &'static str {
        match self {
            CertificateContentType::Pkcs12 => "application/x-pkcs12",
            CertificateContentType::Pem => "application/x-pem-file",
        }
    }
}

impl FromStr for CertificateContentType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "application/x-pkcs12" => Ok(CertificateContentType::Pkcs12),
            "application/x-pem-file" => Ok(CertificateContentType::Pem),
            other => Err(VaultError::PolicyValidation(format!(
                "Unknown content type: {other}"
            ))),
        }
    }
}

/// Key usage flags a policy may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsageType {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    #[serde(rename = "cRLSign")]
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsageType {
    pub const ALL: [KeyUsageType; 9] = [
        KeyUsageType::DigitalSignature,
        KeyUsageType::NonRepudiation,
        KeyUsageType::KeyEncipherment,
        KeyUsageType::DataEncipherment,
        KeyUsageType::KeyAgreement,
        KeyUsageType::KeyCertSign,
        KeyUsageType::CrlSign,
        KeyUsageType::EncipherOnly,
        KeyUsageType::DecipherOnly,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            KeyUsageType::DigitalSignature => "digitalSignature",
            KeyUsageType::NonRepudiation => "nonRepudiation",
            KeyUsageType::KeyEncipherment => "keyEncipherment",
            KeyUsageType::DataEncipherment => "dataEncipherment",
            KeyUsageType::KeyAgreement => "keyAgreement",
            KeyUsageType::KeyCertSign => "keyCertSign",
            KeyUsageType::CrlSign => "cRLSign",
            KeyUsageType::EncipherOnly => "encipherOnly",
            KeyUsageType::DecipherOnly => "decipherOnly",
        }
    }
}

impl From<KeyUsageType> for KeyUsages {
    fn from(value: KeyUsageType) -> Self {
        match value {
            KeyUsageType::DigitalSignature => KeyUsages::DigitalSignature,
            KeyUsageType::NonRepudiation => KeyUsages::NonRepudiation,
            KeyUsageType::KeyEncipherment => KeyUsages::KeyEncipherment,
            KeyUsageType::DataEncipherment => KeyUsages::DataEncipherment,
            KeyUsageType::KeyAgreement => KeyUsages::KeyAgreement,
            KeyUsageType::KeyCertSign => KeyUsages::KeyCertSign,
            KeyUsageType::CrlSign => KeyUsages::CRLSign,
            KeyUsageType::EncipherOnly => KeyUsages::EncipherOnly,
            KeyUsageType::DecipherOnly => KeyUsages::DecipherOnly,
        }
    }
}

impl FromStr for KeyUsageType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        KeyUsageType::ALL
            .into_iter()
            .find(|usage| usage.as_str() == s)
            .ok_or_else(|| VaultError::PolicyValidation(format!("Unknown key usage: {s}")))
    }
}

/// Distinguished name given as an RFC 4514 string, e.g. `CN=example.com,O=Example`.
///
/// The original text is kept so projections echo exactly what was supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistinguishedName {
    text: String,
    name: Name,
}

impl DistinguishedName {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(VaultError::PolicyValidation(
                "Subject must not be blank".to_string(),
            ));
        }
        let name = RdnSequence::from_str(text).map_err(|e| {
            VaultError::PolicyValidation(format!("Invalid subject '{text}': {e}"))
        })?;
        Ok(Self {
            text: text.to_string(),
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> &Name {
        &self.name
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Subject alternative names. Each list keeps the order it was given in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubjectAlternativeNames {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
}

impl SubjectAlternativeNames {
    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty() && self.emails.is_empty() && self.ips.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for (kind, value) in self
            .dns_names
            .iter()
            .map(|v| ("DNS name", v))
            .chain(self.emails.iter().map(|v| ("email", v)))
        {
            if value.trim().is_empty() {
                return Err(VaultError::PolicyValidation(format!("Blank {kind}")));
            }
            Ia5String::new(value).map_err(|e| {
                VaultError::PolicyValidation(format!("Invalid {kind} '{value}': {e}"))
            })?;
        }
        for ip in &self.ips {
            ip.parse::<IpAddr>().map_err(|e| {
                VaultError::PolicyValidation(format!("Invalid IP address '{ip}': {e}"))
            })?;
        }
        Ok(())
    }

    /// IP addresses in their parsed form.
    pub fn ip_addresses(&self) -> Result<Vec<IpAddr>> {
        self.ips
            .iter()
            .map(|ip| {
                ip.parse::<IpAddr>().map_err(|e| {
                    VaultError::PolicyValidation(format!("Invalid IP address '{ip}': {e}"))
                })
            })
            .collect()
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of months.
    pub fn for_months(months: u32) -> Self {
        Self::starting_at(OffsetDateTime::now_utc(), months)
    }

    /// Creates a validity period starting at `start` (truncated to whole
    /// seconds) and lasting the given number of calendar months.
    pub fn starting_at(start: OffsetDateTime, months: u32) -> Self {
        let not_before = start.replace_nanosecond(0).unwrap_or(start);
        Self {
            not_before,
            not_after: add_months(not_before, months),
        }
    }

}

/// Adds calendar months, clamping the day to the end of shorter months.
fn add_months(start: OffsetDateTime, months: u32) -> OffsetDateTime {
    let month_index = start.month() as i64 - 1 + i64::from(months);
    let year = start.year() + (month_index / 12) as i32;
    let month = Month::try_from((month_index % 12 + 1) as u8).unwrap_or(Month::January);
    let day = start
        .day()
        .min(time::util::days_in_year_month(year, month));
    start
        .replace_day(1)
        .and_then(|d| d.replace_year(year))
        .and_then(|d| d.replace_month(month))
        .and_then(|d| d.replace_day(day))
        .unwrap_or(start)
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

/// Immutable certificate policy: everything needed to reproduce a
/// certificate's key material and X.509 shape.
///
/// Built through [`CertificateGenerationInput::builder`]; `build()` validates
/// the whole policy and either returns a complete value or a
/// [`VaultError::PolicyValidation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateGenerationInput {
    key_type: KeyType,
    key_parameter: KeyParameter,
    exportable_private_key: bool,
    reuse_key_on_renewal: bool,
    content_type: CertificateContentType,
    subject: DistinguishedName,
    subject_alternative_names: SubjectAlternativeNames,
    key_usage: Vec<KeyUsageType>,
    extended_key_usage: Vec<ObjectIdentifier>,
    validity_months: u32,
    cert_authority_type: CertAuthorityType,
    enable_transparency: bool,
}

#[bon]
impl CertificateGenerationInput {
    #[builder]
    pub fn new(
        key_type: KeyType,
        key_size: Option<u32>,
        key_curve_name: Option<KeyCurveName>,
        #[builder(default = true)] exportable_private_key: bool,
        #[builder(default)] reuse_key_on_renewal: bool,
        #[builder(default)] content_type: CertificateContentType,
        #[builder(into)] subject: String,
        #[builder(default)] dns_names: Vec<String>,
        #[builder(default)] emails: Vec<String>,
        #[builder(default)] ips: Vec<String>,
        #[builder(default)] key_usage: Vec<KeyUsageType>,
        #[builder(default)] extended_key_usage: Vec<String>,
        #[builder(default = 12)] validity_months: u32,
        #[builder(default)] cert_authority_type: CertAuthorityType,
        #[builder(default)] enable_transparency: bool,
        #[builder(default)] key_policy: KeyPolicyConfig,
    ) -> Result<Self> {
        let key_parameter = resolve_key_parameter(&key_policy, key_type, key_size, key_curve_name)?;

        let subject = DistinguishedName::parse(&subject)?;

        if !(1..=MAX_VALIDITY_MONTHS).contains(&validity_months) {
            return Err(VaultError::PolicyValidation(format!(
                "Validity of {validity_months} months is outside [1, {MAX_VALIDITY_MONTHS}]"
            )));
        }

        let subject_alternative_names = SubjectAlternativeNames {
            dns_names,
            emails,
            ips,
        };
        subject_alternative_names.validate()?;

        let extended_key_usage = extended_key_usage
            .iter()
            .map(|oid| {
                ObjectIdentifier::new(oid).map_err(|e| {
                    VaultError::PolicyValidation(format!("Invalid extended key usage '{oid}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            key_type,
            key_parameter,
            exportable_private_key,
            reuse_key_on_renewal,
            content_type,
            subject,
            subject_alternative_names,
            key_usage,
            extended_key_usage,
            validity_months,
            cert_authority_type,
            enable_transparency,
        })
    }
}

fn resolve_key_parameter(
    config: &KeyPolicyConfig,
    key_type: KeyType,
    key_size: Option<u32>,
    key_curve_name: Option<KeyCurveName>,
) -> Result<KeyParameter> {
    let requested = match (key_type.category(), key_size, key_curve_name) {
        (KeyCategory::Symmetric, _, _) => {
            return Err(VaultError::PolicyValidation(format!(
                "Certificates need an asymmetric key, got {key_type}"
            )));
        }
        (KeyCategory::Rsa, _, Some(curve)) => {
            return Err(VaultError::PolicyValidation(format!(
                "{key_type} keys cannot use curve {curve}"
            )));
        }
        (KeyCategory::EllipticCurve, Some(size), _) => {
            return Err(VaultError::PolicyValidation(format!(
                "{key_type} keys cannot use a key size ({size})"
            )));
        }
        (KeyCategory::Rsa, size, None) => size.map(KeyParameter::Size),
        (KeyCategory::EllipticCurve, None, curve) => curve.map(KeyParameter::Curve),
    };
    key_type
        .validate_or_default_with(config, requested)
        .map_err(|e| VaultError::PolicyValidation(e.to_string()))
}

impl CertificateGenerationInput {
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The validated (or defaulted) key size or curve.
    pub fn key_parameter(&self) -> KeyParameter {
        self.key_parameter
    }

    pub fn key_size(&self) -> Option<u32> {
        self.key_parameter.size()
    }

    pub fn key_curve_name(&self) -> Option<KeyCurveName> {
        self.key_parameter.curve()
    }

    pub fn is_exportable_private_key(&self) -> bool {
        self.exportable_private_key
    }

    pub fn is_reuse_key_on_renewal(&self) -> bool {
        self.reuse_key_on_renewal
    }

    pub fn content_type(&self) -> CertificateContentType {
        self.content_type
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn subject_alternative_names(&self) -> &SubjectAlternativeNames {
        &self.subject_alternative_names
    }

    pub fn dns_names(&self) -> &[String] {
        &self.subject_alternative_names.dns_names
    }

    pub fn emails(&self) -> &[String] {
        &self.subject_alternative_names.emails
    }

    pub fn ips(&self) -> &[String] {
        &self.subject_alternative_names.ips
    }

    pub fn key_usage(&self) -> &[KeyUsageType] {
        &self.key_usage
    }

    pub fn extended_key_usage(&self) -> &[ObjectIdentifier] {
        &self.extended_key_usage
    }

    pub fn validity_months(&self) -> u32 {
        self.validity_months
    }

    pub fn cert_authority_type(&self) -> CertAuthorityType {
        self.cert_authority_type
    }

    pub fn is_enable_transparency(&self) -> bool {
        self.enable_transparency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn ec_input() -> CertificateGenerationInput {
        CertificateGenerationInput::builder()
            .key_type(KeyType::Ec)
            .key_curve_name(KeyCurveName::P384)
            .subject("CN=example.com,O=Example")
            .dns_names(vec!["example.com".to_string(), "www.example.com".to_string()])
            .emails(vec!["admin@example.com".to_string()])
            .ips(vec!["127.0.0.1".to_string(), "::1".to_string()])
            .key_usage(vec![KeyUsageType::DigitalSignature])
            .extended_key_usage(vec!["1.3.6.1.5.5.7.3.1".to_string()])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let input = CertificateGenerationInput::builder()
            .key_type(KeyType::Rsa)
            .subject("CN=test")
            .build()
            .unwrap();
        assert_eq!(input.key_size(), Some(2048));
        assert_eq!(input.key_curve_name(), None);
        assert!(input.is_exportable_private_key());
        assert!(!input.is_reuse_key_on_renewal());
        assert_eq!(input.content_type(), CertificateContentType::Pkcs12);
        assert_eq!(input.validity_months(), 12);
        assert_eq!(input.cert_authority_type(), CertAuthorityType::SelfSigned);
        assert!(!input.is_enable_transparency());
        assert!(input.subject_alternative_names().is_empty());
    }

    #[test]
    fn test_accessors_keep_order() {
        let input = ec_input();
        assert_eq!(input.key_curve_name(), Some(KeyCurveName::P384));
        assert_eq!(input.subject().as_str(), "CN=example.com,O=Example");
        assert_eq!(input.dns_names(), ["example.com", "www.example.com"]);
        assert_eq!(input.ips(), ["127.0.0.1", "::1"]);
        assert_eq!(
            input.extended_key_usage(),
            [ObjectIdentifier::from(ExtendedKeyUsageOption::ServerAuth)]
        );
    }

    #[test]
    fn test_ec_defaults_to_p256() {
        let input = CertificateGenerationInput::builder()
            .key_type(KeyType::EcHsm)
            .subject("CN=test")
            .build()
            .unwrap();
        assert_eq!(input.key_parameter(), KeyParameter::Curve(KeyCurveName::P256));
    }

    #[test]
    fn test_rejects_symmetric_key_type() {
        let result = CertificateGenerationInput::builder()
            .key_type(KeyType::Oct)
            .subject("CN=test")
            .build();
        assert!(matches!(result, Err(VaultError::PolicyValidation(_))));
    }

    #[test]
    fn test_rejects_mismatched_key_parameter() {
        let rsa_with_curve = CertificateGenerationInput::builder()
            .key_type(KeyType::Rsa)
            .key_curve_name(KeyCurveName::P256)
            .subject("CN=test")
            .build();
        assert!(matches!(rsa_with_curve, Err(VaultError::PolicyValidation(_))));

        let ec_with_size = CertificateGenerationInput::builder()
            .key_type(KeyType::Ec)
            .key_size(2048)
            .subject("CN=test")
            .build();
        assert!(matches!(ec_with_size, Err(VaultError::PolicyValidation(_))));
    }

    #[test]
    fn test_rejects_out_of_range_rsa_size() {
        let result = CertificateGenerationInput::builder()
            .key_type(KeyType::Rsa)
            .key_size(1023)
            .subject("CN=test")
            .build();
        assert!(matches!(result, Err(VaultError::PolicyValidation(_))));
    }

    #[test]
    fn test_rejects_bad_subject() {
        for subject in ["", "   ", "not a dn"] {
            let result = CertificateGenerationInput::builder()
                .key_type(KeyType::Ec)
                .subject(subject)
                .build();
            assert!(
                matches!(result, Err(VaultError::PolicyValidation(_))),
                "subject {subject:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_validity() {
        for months in [0, MAX_VALIDITY_MONTHS + 1] {
            let result = CertificateGenerationInput::builder()
                .key_type(KeyType::Ec)
                .subject("CN=test")
                .validity_months(months)
                .build();
            assert!(matches!(result, Err(VaultError::PolicyValidation(_))));
        }
    }

    #[test]
    fn test_rejects_bad_sans_and_ekus() {
        let bad_ip = CertificateGenerationInput::builder()
            .key_type(KeyType::Ec)
            .subject("CN=test")
            .ips(vec!["300.1.1.1".to_string()])
            .build();
        assert!(matches!(bad_ip, Err(VaultError::PolicyValidation(_))));

        let bad_dns = CertificateGenerationInput::builder()
            .key_type(KeyType::Ec)
            .subject("CN=test")
            .dns_names(vec!["bücher.example".to_string()])
            .build();
        assert!(matches!(bad_dns, Err(VaultError::PolicyValidation(_))));

        let bad_eku = CertificateGenerationInput::builder()
            .key_type(KeyType::Ec)
            .subject("CN=test")
            .extended_key_usage(vec!["serverAuth".to_string()])
            .build();
        assert!(matches!(bad_eku, Err(VaultError::PolicyValidation(_))));
    }

    #[test]
    fn test_content_type_mime() {
        assert_eq!(CertificateContentType::Pem.mime_type(), "application/x-pem-file");
        assert_eq!(
            "application/x-pkcs12".parse::<CertificateContentType>().unwrap(),
            CertificateContentType::Pkcs12
        );
        assert!("text/plain".parse::<CertificateContentType>().is_err());
    }

    #[test]
    fn test_validity_months_clamps_day() {
        let validity = Validity::starting_at(datetime!(2024-01-31 10:00:00.5 UTC), 1);
        assert_eq!(validity.not_before, datetime!(2024-01-31 10:00:00 UTC));
        assert_eq!(validity.not_after, datetime!(2024-02-29 10:00:00 UTC));

        let validity = Validity::starting_at(datetime!(2024-11-15 00:00:00 UTC), 14);
        assert_eq!(validity.not_after, datetime!(2026-01-15 00:00:00 UTC));
    }

    #[test]
    fn test_key_usage_names() {
        for usage in KeyUsageType::ALL {
            assert_eq!(usage.as_str().parse::<KeyUsageType>().unwrap(), usage);
        }
    }
}
