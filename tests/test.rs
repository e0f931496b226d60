mod util;

use vaultkit::cert::IssuedCertificate;
use vaultkit::cert::params::{CertificateGenerationInput, Validity};
use vaultkit::entity::CertificateEntity;
use vaultkit::error::VaultError;
use vaultkit::issuer::CertAuthorityType;
use vaultkit::key::{
    KeyCategory, KeyCurveName, KeyGenerator, KeyMaterial, KeyParameter, KeyPolicyConfig, KeyType,
};
use vaultkit::policy::{PolicyModel, PolicyModelConverter};

pub type Result<T> = std::result::Result<T, VaultError>;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn public_types_are_send_and_sync() {
    assert_send_sync::<KeyGenerator>();
    assert_send_sync::<KeyMaterial>();
    assert_send_sync::<CertificateGenerationInput>();
    assert_send_sync::<CertificateEntity>();
    assert_send_sync::<IssuedCertificate>();
    assert_send_sync::<PolicyModel>();
    assert_send_sync::<PolicyModelConverter>();
    assert_send_sync::<VaultError>();
}

/// Every key type yields material of its own category with its default parameter.
#[test]
fn generate_defaults_for_every_key_type() -> Result<()> {
    util::init_tracing();
    let generator = KeyGenerator::default();

    for key_type in KeyType::ALL {
        let material = generator.generate(key_type, None)?;
        match (key_type.category(), &material) {
            (KeyCategory::Symmetric, KeyMaterial::Symmetric(key)) => assert_eq!(key.size(), 256),
            (KeyCategory::Rsa, KeyMaterial::Asymmetric(pair)) => {
                assert_eq!(pair.key_size(), 2048);
                assert_eq!(pair.public_exponent(), Some(65537));
            }
            (KeyCategory::EllipticCurve, KeyMaterial::Asymmetric(pair)) => {
                assert_eq!(pair.curve(), Some(KeyCurveName::P256));
            }
            (category, material) => panic!("{key_type} produced {material:?} for {category:?}"),
        }
    }
    Ok(())
}

/// Parallel generation shares nothing, so every call must succeed and produce distinct keys.
#[test]
fn concurrent_generation_is_independent() {
    let generator = KeyGenerator::default();

    let keys: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                scope.spawn(move || {
                    let curve = if i % 2 == 0 {
                        KeyCurveName::P256
                    } else {
                        KeyCurveName::P384
                    };
                    generator
                        .generate(KeyType::EcHsm, Some(KeyParameter::Curve(curve)))
                        .unwrap()
                        .into_key_pair()
                        .unwrap()
                        .public_key_der()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, key) in keys.iter().enumerate() {
        assert!(keys[i + 1..].iter().all(|other| other != key));
    }

    let secrets: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    generator
                        .generate_symmetric(KeyType::Oct, Some(128))
                        .unwrap()
                        .as_bytes()
                        .to_vec()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(secrets.iter().all(|secret| secret.len() == 16));
    for (i, secret) in secrets.iter().enumerate() {
        assert!(secrets[i + 1..].iter().all(|other| other != secret));
    }
}

#[test]
fn custom_key_policy_bounds() -> Result<()> {
    let config = KeyPolicyConfig::builder()
        .oct_sizes(&[128])
        .oct_default_size(128)
        .default_curve(KeyCurveName::P384)
        .build();
    let generator = KeyGenerator::new(config);

    assert_eq!(generator.generate_symmetric(KeyType::OctHsm, None)?.size(), 128);
    assert!(matches!(
        generator.generate_symmetric(KeyType::Oct, Some(256)),
        Err(VaultError::InvalidParameter(_))
    ));

    let ec = generator.generate(KeyType::Ec, None)?;
    assert_eq!(
        ec.as_key_pair().and_then(|pair| pair.curve()),
        Some(KeyCurveName::P384)
    );
    Ok(())
}

/// A policy goes through issuance and projection and both agree with it.
#[test]
fn policy_to_certificate_and_model() -> Result<()> {
    util::init_tracing();
    let policy = util::ec_policy(KeyCurveName::P384, "CN=vault.localhost,O=Emulator");

    let issued = IssuedCertificate::generate(&policy, &KeyGenerator::default())?;
    let cert = issued
        .certificate
        .as_ref()
        .expect("self-signed policy issues a certificate");
    assert_eq!(issued.key.curve(), Some(KeyCurveName::P384));
    assert_eq!(cert.subject(), "CN=vault.localhost,O=Emulator");
    assert_eq!(
        cert.validity().not_after,
        Validity::starting_at(cert.validity().not_before, policy.validity_months()).not_after
    );

    let entity = util::entity("vault-tls", policy);
    let model = PolicyModelConverter::new().convert(Some(&entity), util::VAULT)?;
    assert_eq!(
        model.id,
        "https://localhost:8443/certificates/vault-tls/policy"
    );
    assert_eq!(model.key_props.crv, Some(KeyCurveName::P384));
    assert_eq!(model.x509_props.subject, "CN=vault.localhost,O=Emulator");
    assert_eq!(model.x509_props.sans.dns_names, ["localhost", "vault.localhost"]);
    assert_eq!(model.x509_props.sans.emails, ["admin@localhost"]);
    assert_eq!(model.x509_props.sans.ips, ["127.0.0.1"]);
    assert_eq!(model.x509_props.ekus, ["1.3.6.1.5.5.7.3.1"]);
    assert_eq!(model.issuer.name, CertAuthorityType::SelfSigned);
    Ok(())
}

/// Projection reads the entity without changing it.
#[test]
fn projection_leaves_entity_untouched() -> Result<()> {
    let entity = util::entity("untouched", util::ec_policy(KeyCurveName::P256, "CN=test"));
    let before = entity.clone();

    let converter = PolicyModelConverter::new();
    let first = converter.convert(Some(&entity), util::VAULT)?;
    let second = converter.convert(Some(&entity), util::VAULT)?;

    assert_eq!(first, second);
    assert_eq!(entity, before);
    Ok(())
}

#[test]
fn serialized_model_shape() -> Result<()> {
    let entity = util::entity("json", util::ec_policy(KeyCurveName::P256K, "CN=json.localhost"));
    let model = PolicyModelConverter::new().convert(Some(&entity), util::VAULT)?;
    let json = serde_json::to_value(&model).expect("policy model serializes");

    assert_eq!(json["key_props"]["kty"], "EC");
    assert_eq!(json["key_props"]["crv"], "P-256K");
    assert_eq!(json["key_props"]["exportable"], true);
    assert_eq!(json["x509_props"]["sans"]["dns_names"][1], "vault.localhost");
    assert_eq!(json["x509_props"]["ekus"][0], "1.3.6.1.5.5.7.3.1");
    assert_eq!(json["secret_props"]["contentType"], "application/x-pem-file");
    assert_eq!(json["attributes"]["enabled"], true);
    assert_eq!(json["attributes"]["created"], json["attributes"]["updated"]);
    Ok(())
}
