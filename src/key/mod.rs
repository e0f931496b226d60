//! Key families, key material and the stateless key generator.

pub mod family;
pub mod generator;
pub mod material;

pub use family::{CurveParameters, KeyCategory, KeyCurveName, KeyParameter, KeyPolicyConfig, KeyType};
pub use generator::KeyGenerator;
pub use material::{KeyMaterial, KeyPair, SymmetricKey};
