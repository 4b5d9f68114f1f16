//! PEM and base64 helpers for certificate payloads

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::error::{CertdogError, CertdogResult};

/// Opening marker of a PEM certificate
pub const CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";
/// Closing marker of a PEM certificate
pub const CERT_FOOTER: &str = "-----END CERTIFICATE-----";

/// Width of the base64 lines written between the PEM markers
pub const PEM_LINE_WIDTH: usize = 64;

/// Line terminator used when writing PEM text
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Line terminator used when writing PEM text
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Decode base64 text, ignoring any whitespace (servers wrap at arbitrary widths)
pub fn decode_base64(data: &str) -> CertdogResult<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CertdogError::CertificateFormat(format!("Invalid base64 data: {}", e)))
}

/// Extract the DER bytes of a PEM certificate
///
/// The markers are optional, so bare base64 is accepted too.
pub fn pem_to_der(pem: &str) -> CertdogResult<Vec<u8>> {
    let body = pem.replace(CERT_HEADER, "").replace(CERT_FOOTER, "");
    let der = decode_base64(&body)?;
    if der.is_empty() {
        return Err(CertdogError::CertificateFormat(
            "No certificate data found".to_string(),
        ));
    }
    Ok(der)
}

/// Encode DER bytes as a PEM certificate
pub fn der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / PEM_LINE_WIDTH * 2 + 64);

    pem.push_str(CERT_HEADER);
    pem.push_str(LINE_ENDING);
    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % PEM_LINE_WIDTH == 0 {
            pem.push_str(LINE_ENDING);
        }
        pem.push(ch);
    }
    pem.push_str(LINE_ENDING);
    pem.push_str(CERT_FOOTER);
    pem.push_str(LINE_ENDING);
    pem
}
