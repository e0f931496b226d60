use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{Result, VaultError};
use crate::key::KeyPair;

/// Picks the signature algorithm a key pair signs certificates with.
pub fn signature_algorithm(key: &KeyPair) -> SignatureAlgorithm {
    match key {
        KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
        KeyPair::EcdsaP256(_) | KeyPair::EcdsaP256K(_) => SignatureAlgorithm::Sha256WithECDSA,
        KeyPair::EcdsaP384(_) => SignatureAlgorithm::Sha384WithECDSA,
        KeyPair::EcdsaP521(_) => SignatureAlgorithm::Sha512WithECDSA,
    }
}

/// Signs `data` with the private half of `key`.
///
/// RSA signatures are PKCS#1 v1.5, ECDSA signatures are DER encoded.
pub fn sign_data(data: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
    let signature = match key {
        KeyPair::Rsa { private, .. } => {
            let signing_key: RsaSigningKey<Sha256> = RsaSigningKey::new(*private.clone());
            signing_key.try_sign(data).map_err(signing_failure)?.to_vec()
        }
        KeyPair::EcdsaP256(secret) => {
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_failure)?;
            signature.to_der().as_bytes().to_vec()
        }
        KeyPair::EcdsaP256K(secret) => {
            let signing_key = k256::ecdsa::SigningKey::from(secret);
            let signature: k256::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_failure)?;
            signature.to_der().as_bytes().to_vec()
        }
        KeyPair::EcdsaP384(secret) => {
            let signing_key = p384::ecdsa::SigningKey::from(secret);
            let signature: p384::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_failure)?;
            signature.to_der().as_bytes().to_vec()
        }
        KeyPair::EcdsaP521(secret) => {
            let signing_key =
                p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(signing_failure)?;
            let signature: p521::ecdsa::Signature =
                signing_key.try_sign(data).map_err(signing_failure)?;
            signature.to_der().as_bytes().to_vec()
        }
    };
    Ok(signature)
}

/// SHA-1 over the subject public key bits (RFC 5280, 4.2.1.2 method 1).
pub fn key_identifier(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

fn signing_failure(err: rsa::signature::Error) -> VaultError {
    VaultError::crypto("Failed to sign certificate.", err)
}
