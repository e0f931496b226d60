use std::fmt;
use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use serde::Serialize;

use crate::error::{Result, VaultError};

/// Object identifier of the secp256k1 named curve (SEC 2).
const SECP_256_K_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

const DEFAULT_OCT_SIZES: &[u32] = &[128, 192, 256];

/// Bounds and defaults applied by [`KeyType::validate_or_default_with`].
///
/// The [`Default`] value holds the documented constants; callers may build a
/// different table without changing how validation behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct KeyPolicyConfig {
    #[builder(default = 1024)]
    pub rsa_min_size: u32,
    #[builder(default = 4096)]
    pub rsa_max_size: u32,
    #[builder(default = 2048)]
    pub rsa_default_size: u32,
    #[builder(default = 65537)]
    pub rsa_default_public_exponent: u32,
    #[builder(default = DEFAULT_OCT_SIZES)]
    pub oct_sizes: &'static [u32],
    #[builder(default = 256)]
    pub oct_default_size: u32,
    #[builder(default = KeyCurveName::P256)]
    pub default_curve: KeyCurveName,
}

impl Default for KeyPolicyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl KeyPolicyConfig {
    /// Checks that the table is self-consistent: RSA bounds are ordered and
    /// hold the default, and every symmetric size is a non-zero whole number
    /// of bytes with the default among them.
    pub fn validate(&self) -> Result<()> {
        if self.rsa_min_size > self.rsa_max_size {
            return Err(VaultError::InvalidParameter(format!(
                "RSA size bounds [{}, {}] are inverted",
                self.rsa_min_size, self.rsa_max_size
            )));
        }
        if !(self.rsa_min_size..=self.rsa_max_size).contains(&self.rsa_default_size) {
            return Err(VaultError::InvalidParameter(format!(
                "Default RSA key size {} is outside [{}, {}]",
                self.rsa_default_size, self.rsa_min_size, self.rsa_max_size
            )));
        }
        if let Some(size) = self
            .oct_sizes
            .iter()
            .find(|size| **size == 0 || **size % 8 != 0)
        {
            return Err(VaultError::InvalidParameter(format!(
                "Symmetric key size {size} is not a whole number of bytes"
            )));
        }
        if !self.oct_sizes.contains(&self.oct_default_size) {
            return Err(VaultError::InvalidParameter(format!(
                "Default symmetric key size {} is not one of {:?}",
                self.oct_default_size, self.oct_sizes
            )));
        }
        Ok(())
    }
}

/// Shape of the parameter a key family accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    /// Opaque secret bytes, parameterised by size in bits.
    Symmetric,
    /// RSA key pair, parameterised by modulus size in bits.
    Rsa,
    /// Elliptic curve key pair, parameterised by curve.
    EllipticCurve,
}

/// Capability row of a key family.
#[derive(Debug, Clone, Copy)]
struct FamilyRules {
    name: &'static str,
    algorithm: &'static str,
    category: KeyCategory,
    hsm: bool,
}

/// Supported key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyType {
    #[serde(rename = "EC")]
    Ec,
    #[serde(rename = "EC-HSM")]
    EcHsm,
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "RSA-HSM")]
    RsaHsm,
    #[serde(rename = "oct")]
    Oct,
    #[serde(rename = "oct-HSM")]
    OctHsm,
}

impl KeyType {
    pub const ALL: [KeyType; 6] = [
        KeyType::Ec,
        KeyType::EcHsm,
        KeyType::Rsa,
        KeyType::RsaHsm,
        KeyType::Oct,
        KeyType::OctHsm,
    ];

    const fn rules(self) -> FamilyRules {
        match self {
            KeyType::Ec => FamilyRules {
                name: "EC",
                algorithm: "EC",
                category: KeyCategory::EllipticCurve,
                hsm: false,
            },
            KeyType::EcHsm => FamilyRules {
                name: "EC-HSM",
                algorithm: "EC",
                category: KeyCategory::EllipticCurve,
                hsm: true,
            },
            KeyType::Rsa => FamilyRules {
                name: "RSA",
                algorithm: "RSA",
                category: KeyCategory::Rsa,
                hsm: false,
            },
            KeyType::RsaHsm => FamilyRules {
                name: "RSA-HSM",
                algorithm: "RSA",
                category: KeyCategory::Rsa,
                hsm: true,
            },
            KeyType::Oct => FamilyRules {
                name: "oct",
                algorithm: "AES",
                category: KeyCategory::Symmetric,
                hsm: false,
            },
            KeyType::OctHsm => FamilyRules {
                name: "oct-HSM",
                algorithm: "AES",
                category: KeyCategory::Symmetric,
                hsm: true,
            },
        }
    }

    /// The wire name of the key type, e.g. `RSA-HSM`.
    pub const fn as_str(self) -> &'static str {
        self.rules().name
    }

    /// The algorithm identifier handed to the cryptographic provider.
    pub const fn algorithm_name(self) -> &'static str {
        self.rules().algorithm
    }

    pub const fn category(self) -> KeyCategory {
        self.rules().category
    }

    pub const fn is_hsm(self) -> bool {
        self.rules().hsm
    }

    pub const fn is_asymmetric(self) -> bool {
        !matches!(self.rules().category, KeyCategory::Symmetric)
    }

    /// Validates the parameter against the default rules, or returns the
    /// family default when it is absent.
    pub fn validate_or_default(self, param: Option<KeyParameter>) -> Result<KeyParameter> {
        self.validate_or_default_with(&KeyPolicyConfig::default(), param)
    }

    /// Validates the parameter against `config`, or returns the family default
    /// when it is absent. A valid parameter is returned unchanged.
    ///
    /// An inconsistent `config` is rejected before anything else, so the
    /// result is always inside the table's bounds.
    pub fn validate_or_default_with(
        self,
        config: &KeyPolicyConfig,
        param: Option<KeyParameter>,
    ) -> Result<KeyParameter> {
        config.validate()?;
        match (self.category(), param) {
            (KeyCategory::Symmetric, None) => Ok(KeyParameter::Size(config.oct_default_size)),
            (KeyCategory::Symmetric, Some(KeyParameter::Size(size))) => {
                if config.oct_sizes.contains(&size) {
                    Ok(KeyParameter::Size(size))
                } else {
                    Err(VaultError::InvalidParameter(format!(
                        "{} key size {} is not one of {:?}",
                        self, size, config.oct_sizes
                    )))
                }
            }
            (KeyCategory::Rsa, None) => Ok(KeyParameter::Size(config.rsa_default_size)),
            (KeyCategory::Rsa, Some(KeyParameter::Size(size))) => {
                if (config.rsa_min_size..=config.rsa_max_size).contains(&size) {
                    Ok(KeyParameter::Size(size))
                } else {
                    Err(VaultError::InvalidParameter(format!(
                        "{} key size {} is outside [{}, {}]",
                        self, size, config.rsa_min_size, config.rsa_max_size
                    )))
                }
            }
            (KeyCategory::EllipticCurve, None) => Ok(KeyParameter::Curve(config.default_curve)),
            (KeyCategory::EllipticCurve, Some(KeyParameter::Curve(curve))) => {
                Ok(KeyParameter::Curve(curve))
            }
            (_, Some(other)) => Err(VaultError::InvalidParameter(format!(
                "{} keys do not accept parameter {}",
                self, other
            ))),
        }
    }

    /// Typed shorthand of [`Self::validate_or_default_with`] for sized families.
    pub fn validate_size(self, config: &KeyPolicyConfig, size: Option<u32>) -> Result<u32> {
        match self.validate_or_default_with(config, size.map(KeyParameter::Size))? {
            KeyParameter::Size(size) => Ok(size),
            KeyParameter::Curve(curve) => Err(VaultError::InvalidParameter(format!(
                "{} keys are sized by curve {}, not by bits",
                self, curve
            ))),
        }
    }

    /// Typed shorthand of [`Self::validate_or_default_with`] for curve families.
    pub fn validate_curve(
        self,
        config: &KeyPolicyConfig,
        curve: Option<KeyCurveName>,
    ) -> Result<KeyCurveName> {
        match self.validate_or_default_with(config, curve.map(KeyParameter::Curve))? {
            KeyParameter::Curve(curve) => Ok(curve),
            KeyParameter::Size(size) => Err(VaultError::InvalidParameter(format!(
                "{} keys are sized by bits ({}), not by curve",
                self, size
            ))),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        KeyType::ALL
            .into_iter()
            .find(|kty| kty.as_str() == s)
            .ok_or_else(|| VaultError::InvalidParameter(format!("Unknown key type: {s}")))
    }
}

/// Fixed parameter set of a named curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveParameters {
    /// SEC 2 name of the curve.
    pub name: &'static str,
    /// Named-curve object identifier used in SubjectPublicKeyInfo.
    pub oid: ObjectIdentifier,
    /// Size of the underlying field in bits.
    pub field_size: u32,
}

/// Supported elliptic curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyCurveName {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-256K")]
    P256K,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
}

impl KeyCurveName {
    pub const ALL: [KeyCurveName; 4] = [
        KeyCurveName::P256,
        KeyCurveName::P256K,
        KeyCurveName::P384,
        KeyCurveName::P521,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            KeyCurveName::P256 => "P-256",
            KeyCurveName::P256K => "P-256K",
            KeyCurveName::P384 => "P-384",
            KeyCurveName::P521 => "P-521",
        }
    }

    pub const fn parameters(self) -> CurveParameters {
        match self {
            KeyCurveName::P256 => CurveParameters {
                name: "secp256r1",
                oid: const_oid::db::rfc5912::SECP_256_R_1,
                field_size: 256,
            },
            KeyCurveName::P256K => CurveParameters {
                name: "secp256k1",
                oid: SECP_256_K_1,
                field_size: 256,
            },
            KeyCurveName::P384 => CurveParameters {
                name: "secp384r1",
                oid: const_oid::db::rfc5912::SECP_384_R_1,
                field_size: 384,
            },
            KeyCurveName::P521 => CurveParameters {
                name: "secp521r1",
                oid: const_oid::db::rfc5912::SECP_521_R_1,
                field_size: 521,
            },
        }
    }
}

impl fmt::Display for KeyCurveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyCurveName {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        KeyCurveName::ALL
            .into_iter()
            .find(|curve| curve.as_str() == s)
            .ok_or_else(|| VaultError::InvalidParameter(format!("Unknown curve: {s}")))
    }
}

/// A key size in bits or a named curve, depending on the key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyParameter {
    Size(u32),
    Curve(KeyCurveName),
}

impl KeyParameter {
    pub fn size(self) -> Option<u32> {
        match self {
            KeyParameter::Size(size) => Some(size),
            KeyParameter::Curve(_) => None,
        }
    }

    pub fn curve(self) -> Option<KeyCurveName> {
        match self {
            KeyParameter::Curve(curve) => Some(curve),
            KeyParameter::Size(_) => None,
        }
    }
}

impl fmt::Display for KeyParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParameter::Size(size) => write!(f, "{size} bits"),
            KeyParameter::Curve(curve) => write!(f, "curve {curve}"),
        }
    }
}
