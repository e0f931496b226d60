use rand_core::{OsRng, RngCore};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use tracing::{debug, error};

use crate::error::{ProviderError, Result, VaultError};
use crate::key::family::{KeyCategory, KeyCurveName, KeyParameter, KeyPolicyConfig, KeyType};
use crate::key::material::{KeyMaterial, KeyPair, SymmetricKey};

/// Largest public exponent the RSA provider accepts (2^33 - 1).
const MAX_RSA_PUBLIC_EXPONENT: u64 = (1 << 33) - 1;

/// Stateless key material generator.
///
/// Every call builds its own random source and keeps nothing afterwards, so a
/// single generator can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator {
    config: KeyPolicyConfig,
}

impl KeyGenerator {
    pub fn new(config: KeyPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyPolicyConfig {
        &self.config
    }

    /// Generates key material for any key type, validating or defaulting `param`.
    pub fn generate(&self, key_type: KeyType, param: Option<KeyParameter>) -> Result<KeyMaterial> {
        let param = key_type.validate_or_default_with(&self.config, param)?;
        match (key_type.category(), param) {
            (KeyCategory::Symmetric, KeyParameter::Size(size)) => {
                Ok(self.generate_symmetric(key_type, Some(size))?.into())
            }
            (KeyCategory::Rsa, KeyParameter::Size(size)) => {
                Ok(self.generate_rsa(Some(size), None)?.into())
            }
            (KeyCategory::EllipticCurve, KeyParameter::Curve(curve)) => {
                Ok(self.generate_ec(curve)?.into())
            }
            (_, param) => Err(VaultError::InvalidParameter(format!(
                "{key_type} keys do not accept parameter {param}"
            ))),
        }
    }

    /// Generates a symmetric key of the given (or default) size.
    pub fn generate_symmetric(&self, key_type: KeyType, size: Option<u32>) -> Result<SymmetricKey> {
        if key_type.category() != KeyCategory::Symmetric {
            return Err(VaultError::InvalidParameter(format!(
                "{key_type} is not a symmetric key type"
            )));
        }
        let size = key_type.validate_size(&self.config, size)?;

        let mut rng = OsRng;
        let mut bytes = vec![0u8; (size / 8) as usize];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| provider_failure(key_type.algorithm_name(), e))?;

        debug!(
            algorithm = key_type.algorithm_name(),
            size, "generated symmetric key"
        );
        Ok(SymmetricKey::new(bytes))
    }

    /// Generates an elliptic curve key pair on the given curve.
    pub fn generate_ec(&self, curve: KeyCurveName) -> Result<KeyPair> {
        let params = curve.parameters();
        let mut rng = OsRng;
        let pair = match curve {
            KeyCurveName::P256 => KeyPair::EcdsaP256(p256::SecretKey::random(&mut rng)),
            KeyCurveName::P256K => KeyPair::EcdsaP256K(k256::SecretKey::random(&mut rng)),
            KeyCurveName::P384 => KeyPair::EcdsaP384(p384::SecretKey::random(&mut rng)),
            KeyCurveName::P521 => KeyPair::EcdsaP521(p521::SecretKey::random(&mut rng)),
        };

        debug!(
            algorithm = KeyType::Ec.algorithm_name(),
            curve = %curve,
            oid = %params.oid,
            "generated EC key pair"
        );
        Ok(pair)
    }

    /// Generates an RSA key pair. The size is validated or defaulted and the
    /// public exponent defaults to 65537.
    pub fn generate_rsa(&self, size: Option<u32>, public_exponent: Option<u64>) -> Result<KeyPair> {
        let size = KeyType::Rsa.validate_size(&self.config, size)?;
        let exponent = self.validate_public_exponent(public_exponent)?;

        let mut rng = OsRng;
        let private =
            RsaPrivateKey::new_with_exp(&mut rng, size as usize, &BigUint::from(exponent))
                .map_err(|e| provider_failure(KeyType::Rsa.algorithm_name(), e))?;
        let public = RsaPublicKey::from(&private);

        debug!(
            algorithm = KeyType::Rsa.algorithm_name(),
            size, exponent, "generated RSA key pair"
        );
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    fn validate_public_exponent(&self, exponent: Option<u64>) -> Result<u64> {
        let exponent = exponent.unwrap_or(u64::from(self.config.rsa_default_public_exponent));
        if exponent < 3 || exponent % 2 == 0 || exponent > MAX_RSA_PUBLIC_EXPONENT {
            return Err(VaultError::InvalidParameter(format!(
                "RSA public exponent {exponent} must be odd and within [3, {MAX_RSA_PUBLIC_EXPONENT}]"
            )));
        }
        Ok(exponent)
    }
}

fn provider_failure<E>(algorithm: &str, err: E) -> VaultError
where
    E: Into<ProviderError>,
{
    let source = err.into();
    error!(algorithm, error = %source, "key generation failed");
    VaultError::crypto(format!("Failed to generate {algorithm} key."), source)
}
