mod util;

use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::X509;
use vaultkit::cert::IssuedCertificate;
use vaultkit::key::{KeyCurveName, KeyGenerator};

fn issue(policy: &vaultkit::cert::params::CertificateGenerationInput) -> IssuedCertificate {
    util::init_tracing();
    IssuedCertificate::generate(policy, &KeyGenerator::default()).unwrap()
}

fn common_name(x509: &X509) -> String {
    x509.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_parses_self_signed_ec_certificates() {
    let cases = [
        (KeyCurveName::P256, Nid::X9_62_PRIME256V1, Nid::ECDSA_WITH_SHA256),
        (KeyCurveName::P256K, Nid::SECP256K1, Nid::ECDSA_WITH_SHA256),
        (KeyCurveName::P384, Nid::SECP384R1, Nid::ECDSA_WITH_SHA384),
        (KeyCurveName::P521, Nid::SECP521R1, Nid::ECDSA_WITH_SHA512),
    ];

    for (curve, curve_nid, signature_nid) in cases {
        let issued = issue(&util::ec_policy(curve, "CN=ec.localhost,O=Emulator"));
        let cert = issued.certificate.as_ref().unwrap();
        let x509 = X509::from_der(&cert.to_der().unwrap()).expect("Failed to parse DER");

        assert_eq!(common_name(&x509), "ec.localhost");
        assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
        assert_eq!(x509.signature_algorithm().object().nid(), signature_nid);

        let public_key = x509.public_key().unwrap();
        assert_eq!(
            public_key.ec_key().unwrap().group().curve_name(),
            Some(curve_nid),
            "{curve} curve mismatch"
        );
        assert!(x509.verify(&public_key).unwrap(), "{curve} self-signature does not verify");

        let ski = x509.subject_key_id().expect("subject key identifier");
        let aki = x509.authority_key_id().expect("authority key identifier");
        assert_eq!(ski.as_slice(), aki.as_slice());
    }
}

#[test]
fn test_openssl_reads_subject_alternative_names() {
    let issued = issue(&util::ec_policy(KeyCurveName::P256, "CN=san.localhost"));
    let pem = issued.certificate.as_ref().unwrap().to_pem().unwrap();
    let x509 = X509::from_pem(pem.as_bytes()).expect("Failed to parse PEM");

    let names = x509.subject_alt_names().expect("SAN extension");
    let dns: Vec<&str> = names.iter().filter_map(|name| name.dnsname()).collect();
    let emails: Vec<&str> = names.iter().filter_map(|name| name.email()).collect();
    let ips: Vec<&[u8]> = names.iter().filter_map(|name| name.ipaddress()).collect();

    assert_eq!(dns, ["localhost", "vault.localhost"]);
    assert_eq!(emails, ["admin@localhost"]);
    assert_eq!(ips, [&[127u8, 0, 0, 1][..]]);
}

#[test]
fn test_openssl_validity_spans_requested_months() {
    let issued = issue(&util::rsa_policy(2048, "CN=rsa.localhost"));
    let x509 = X509::from_der(&issued.certificate.as_ref().unwrap().to_der().unwrap()).unwrap();

    // 24 calendar months cover 730 or 731 days.
    let diff = x509.not_before().diff(x509.not_after()).unwrap();
    assert!((730..=731).contains(&diff.days), "unexpected span of {} days", diff.days);
    assert_eq!(diff.secs, 0);
}

#[test]
fn test_openssl_accepts_rsa_certificate_and_key() {
    let issued = issue(&util::rsa_policy(2048, "CN=rsa.localhost"));
    let x509 = X509::from_der(&issued.certificate.as_ref().unwrap().to_der().unwrap()).unwrap();

    assert_eq!(common_name(&x509), "rsa.localhost");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    let public_key = x509.public_key().unwrap();
    assert_eq!(public_key.bits(), 2048);
    assert_eq!(
        public_key.rsa().unwrap().e().to_dec_str().unwrap().to_string(),
        "65537"
    );
    assert!(x509.verify(&public_key).unwrap());

    let private_pem = issued.key.to_pkcs8_pem().unwrap();
    let private_key = PKey::private_key_from_pem(private_pem.as_bytes()).unwrap();
    assert!(private_key.public_eq(&public_key));
}

#[test]
fn test_openssl_reads_pem_secret_bundle() {
    let issued = issue(&util::ec_policy(KeyCurveName::P384, "CN=bundle.localhost"));
    let bundle = issued.secret_bundle().unwrap();

    let private_key = PKey::private_key_from_pem(bundle.as_bytes()).unwrap();
    let certs = X509::stack_from_pem(bundle.as_bytes()).unwrap();
    assert_eq!(certs.len(), 1);
    assert!(private_key.public_eq(&certs[0].public_key().unwrap()));
    assert_eq!(common_name(&certs[0]), "bundle.localhost");
}
