use crate::error::{Result, VaultError};

/// Wraps DER bytes in a PEM block with the given label, using `\n` line endings.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Reads the first PEM block of `pem_str`, which must carry `label`.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| VaultError::Encoding(e.to_string()))?;
    if pem.tag() != label {
        return Err(VaultError::Encoding(format!(
            "Expected a PEM block labelled {label}, found {}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}
