//! # VaultKit - Policy-Driven Key and Certificate Generation
//!
//! VaultKit is the cryptographic core of a local secrets-vault emulator, built entirely with
//! rustcrypto libraries. It turns a declarative certificate policy into fresh key material and,
//! for self-signed policies, into a signed X.509 certificate. It also projects stored
//! certificate entities into the policy model a vault API returns.
//!
//! ## Supported Key Types
//!
//! - **RSA** / **RSA-HSM**: 1024 to 4096-bit keys, 2048 by default, public exponent 65537
//! - **EC** / **EC-HSM**: P-256, P-256K (secp256k1), P-384 and P-521, P-256 by default
//! - **oct** / **oct-HSM**: 128, 192 or 256-bit symmetric keys, 256 by default
//!
//! HSM variants behave exactly like their software counterparts.
//!
//! ## Quick Start
//!
//! ### Generating Key Material
//!
//! ```rust,no_run
//! use vaultkit::key::{KeyCurveName, KeyGenerator, KeyParameter, KeyType};
//!
//! # fn main() -> Result<(), vaultkit::error::VaultError> {
//! let generator = KeyGenerator::default();
//!
//! // Defaults are applied when no size or curve is given
//! let aes = generator.generate_symmetric(KeyType::Oct, None)?;
//! assert_eq!(aes.size(), 256);
//!
//! let ec = generator.generate(KeyType::EcHsm, Some(KeyParameter::Curve(KeyCurveName::P384)))?;
//! println!("{:?}", ec.as_key_pair().map(|key| key.curve()));
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing a Self-Signed Certificate
//!
//! ```rust,no_run
//! use vaultkit::{
//!     cert::{IssuedCertificate, params::{CertificateContentType, CertificateGenerationInput}},
//!     key::{KeyGenerator, KeyType},
//! };
//!
//! # fn main() -> Result<(), vaultkit::error::VaultError> {
//! let policy = CertificateGenerationInput::builder()
//!     .key_type(KeyType::Rsa)
//!     .key_size(2048)
//!     .subject("CN=localhost")
//!     .dns_names(vec!["localhost".to_string()])
//!     .content_type(CertificateContentType::Pem)
//!     .validity_months(24)
//!     .build()?;
//!
//! let issued = IssuedCertificate::generate(&policy, &KeyGenerator::default())?;
//! println!("{}", issued.secret_bundle()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Projecting a Policy
//!
//! ```rust,no_run
//! use vaultkit::{
//!     cert::params::CertificateGenerationInput,
//!     entity::{CertificateEntity, CertificateId},
//!     key::KeyType,
//!     policy::PolicyModelConverter,
//! };
//!
//! # fn main() -> Result<(), vaultkit::error::VaultError> {
//! let policy = CertificateGenerationInput::builder()
//!     .key_type(KeyType::Ec)
//!     .subject("CN=test")
//!     .build()?;
//! let entity = CertificateEntity::builder()
//!     .id(CertificateId::new("https://localhost:8443", "test", "0001")?)
//!     .generator(policy)
//!     .build();
//!
//! let model = PolicyModelConverter::new().convert(Some(&entity), "https://localhost:8443")?;
//! assert_eq!(model.id, "https://localhost:8443/certificates/test/policy");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`error::VaultError`]. Invalid input is reported before any
//! cryptographic work starts:
//!
//! ```rust
//! use vaultkit::{error::VaultError, key::{KeyGenerator, KeyType}};
//!
//! match KeyGenerator::default().generate_symmetric(KeyType::Oct, Some(100)) {
//!     Ok(_) => unreachable!(),
//!     Err(VaultError::InvalidParameter(msg)) => println!("Rejected: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key family rules and key material generation
//! - [`cert`]: Certificate policies, issuance, encoding and X.509 extensions
//! - [`issuer`]: Certificate authorities and signing
//! - [`entity`]: Stored certificate versions
//! - [`policy`]: Projection of entities into the API policy model
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod cert;
pub mod entity;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod pki;
pub mod policy;
pub mod tbs_certificate;
