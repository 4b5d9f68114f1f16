//! Writing issued certificate material to disk

use std::fs;
use std::path::Path;

use tracing::info;

use crate::utils::error::{CertdogError, CertdogResult};
use crate::utils::pem::decode_base64;

/// Save base64 PKCS12/PFX data as binary
pub fn save_p12(p12_base64: &str, path: impl AsRef<Path>) -> CertdogResult<()> {
    let data = decode_base64(p12_base64)?;
    write(path.as_ref(), &data)
}

/// Save base64 JKS data as binary
pub fn save_jks(jks_base64: &str, path: impl AsRef<Path>) -> CertdogResult<()> {
    save_p12(jks_base64, path)
}

/// Save PEM text verbatim
pub fn save_pem(pem: &str, path: impl AsRef<Path>) -> CertdogResult<()> {
    write(path.as_ref(), pem.as_bytes())
}

/// Save certificate text verbatim
pub fn save_cert(cert: &str, path: impl AsRef<Path>) -> CertdogResult<()> {
    write(path.as_ref(), cert.as_bytes())
}

fn write(path: &Path, data: &[u8]) -> CertdogResult<()> {
    fs::write(path, data).map_err(|source| CertdogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} bytes to {}", data.len(), path.display());
    Ok(())
}
