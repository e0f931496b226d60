//! Error type shared by every vaultkit module.

use thiserror::Error;

/// Boxed provider failure kept as the cause of a [`VaultError::CryptoGeneration`].
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents errors that can occur in the vaultkit library.
///
/// Every failure is deterministic for a given input, so none of these are
/// retried internally.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The certificate generation input is malformed.
    #[error("Invalid certificate policy: {0}")]
    PolicyValidation(String),

    /// A key size or curve is out of range or unknown for its key type.
    #[error("Invalid key parameter: {0}")]
    InvalidParameter(String),

    /// The cryptographic provider failed while generating keys or signing.
    #[error("Cryptographic provider failure: {message}")]
    CryptoGeneration {
        message: String,
        #[source]
        source: ProviderError,
    },

    /// An argument handed to a projection was absent or invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),
}

impl VaultError {
    /// Wraps a provider failure, keeping the original error as the source.
    pub fn crypto<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<ProviderError>,
    {
        VaultError::CryptoGeneration {
            message: message.into(),
            source: source.into(),
        }
    }
}

impl From<der::Error> for VaultError {
    fn from(err: der::Error) -> Self {
        VaultError::Encoding(err.to_string())
    }
}

impl From<pkcs8::Error> for VaultError {
    fn from(err: pkcs8::Error) -> Self {
        VaultError::Encoding(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for VaultError {
    fn from(err: pkcs8::spki::Error) -> Self {
        VaultError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
