//! Certificate models: parsed X.509 certificates and issued payloads

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::time::ASN1Time;

use crate::services::storage;
use crate::utils::error::{CertdogError, CertdogResult};
use crate::utils::pem;

/// Format in which an issued certificate and its key are returned
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    /// Base64 PKCS#12 (PFX), the format certdog always produces first
    #[default]
    Pkcs12,
    /// Base64 Java KeyStore
    Jks,
    /// PEM text
    Pem,
}

impl OutputFormat {
    /// Whether the payload is base64 binary data rather than text
    pub fn is_binary(self) -> bool {
        matches!(self, OutputFormat::Pkcs12 | OutputFormat::Jks)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Pkcs12 => "PKCS12",
            OutputFormat::Jks => "JKS",
            OutputFormat::Pem => "PEM",
        };
        f.write_str(name)
    }
}

/// Certificate material returned by a DN certificate request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePayload {
    /// Identifier certdog assigned to the issued certificate
    pub id: String,
    /// Format of `data`
    pub format: OutputFormat,
    /// Base64 PKCS12/JKS data, or PEM text
    pub data: String,
}

impl CertificatePayload {
    /// Write the payload to `path`: binary formats are base64-decoded,
    /// PEM is written verbatim
    pub fn save(&self, path: impl AsRef<Path>) -> CertdogResult<()> {
        match self.format {
            OutputFormat::Pkcs12 => storage::save_p12(&self.data, path),
            OutputFormat::Jks => storage::save_jks(&self.data, path),
            OutputFormat::Pem => storage::save_pem(&self.data, path),
        }
    }
}

/// A parsed X.509 certificate
///
/// The DER encoding is kept as received; the remaining fields are read from
/// it once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial_number: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    /// Parse a DER-encoded certificate
    pub fn from_der(der: Vec<u8>) -> CertdogResult<Self> {
        let (subject, issuer, serial_number, not_before, not_after) = {
            let (rest, cert) = X509Certificate::from_der(&der).map_err(|e| {
                CertdogError::CertificateFormat(format!("Failed to parse certificate: {}", e))
            })?;
            if !rest.is_empty() {
                return Err(CertdogError::CertificateFormat(format!(
                    "{} trailing bytes after certificate",
                    rest.len()
                )));
            }

            let validity = cert.validity();
            (
                cert.subject().to_string(),
                cert.issuer().to_string(),
                serial_to_hex(cert.raw_serial()),
                asn1_time_to_utc(&validity.not_before)?,
                asn1_time_to_utc(&validity.not_after)?,
            )
        };

        Ok(Self {
            der,
            subject,
            issuer,
            serial_number,
            not_before,
            not_after,
        })
    }

    /// Parse a PEM certificate; whitespace anywhere in the base64 body is ignored
    pub fn from_pem(pem_text: &str) -> CertdogResult<Self> {
        Self::from_der(pem::pem_to_der(pem_text)?)
    }

    /// DER encoding
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Consume the certificate, returning its DER encoding
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// Subject distinguished name
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number as lowercase hex without leading zeros or `0x`
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Start of the validity window
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity window
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// PEM encoding, 64 columns, platform line terminator
    pub fn to_pem(&self) -> String {
        pem::der_to_pem(&self.der)
    }

    /// Write the certificate to `path` as PEM
    pub fn save_pem(&self, path: impl AsRef<Path>) -> CertdogResult<()> {
        storage::save_cert(&self.to_pem(), path)
    }
}

fn serial_to_hex(raw: &[u8]) -> String {
    let encoded = hex::encode(raw);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn asn1_time_to_utc(time: &ASN1Time) -> CertdogResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0).ok_or_else(|| {
        CertdogError::CertificateFormat(format!("Validity time out of range: {}", time.timestamp()))
    })
}
