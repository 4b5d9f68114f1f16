//! Error types and handling
//!
//! Every failure surfaced by the client maps to one [`CertdogError`] variant.
//! Operation-specific variants (certificate request, revocation) wrap the
//! first failing step as their source so the HTTP status and body stay
//! reachable for diagnostics.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum CertdogError {
    /// A session-mode operation was attempted before `login`
    #[error("Not logged in. Call login first")]
    NotLoggedIn,

    /// The login call failed (transport, credentials or response shape)
    #[error("Login to the certdog API failed: {0}")]
    Authentication(String),

    /// The API answered with a status other than 200 OK
    #[error("API request failed with status {status}: {body}")]
    Api {
        /// HTTP status returned by the service
        status: StatusCode,
        /// Response body, verbatim
        body: String,
    },

    /// Requesting a certificate from a DN failed at one of its steps
    #[error("Requesting certificate with DN '{dn}' failed: {source}")]
    CertificateRequest {
        dn: String,
        #[source]
        source: Box<CertdogError>,
    },

    /// Requesting a certificate from a CSR failed
    #[error("Requesting certificate from CSR with issuer '{issuer}' failed: {source}")]
    CsrRequest {
        issuer: String,
        #[source]
        source: Box<CertdogError>,
    },

    /// Revoking a certificate failed
    #[error("Revocation of certificate with serial number {serial} failed: {source}")]
    Revocation {
        serial: String,
        #[source]
        source: Box<CertdogError>,
    },

    /// PEM, base64 or X.509 decoding failed
    #[error("Certificate format error: {0}")]
    CertificateFormat(String),

    /// Writing a file failed
    #[error("Unable to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request could not be sent or its body read
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 200 response carried a body that could not be decoded
    #[error("Invalid response from certdog: {0}")]
    InvalidResponse(String),

    /// Caller input rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CertdogError {
    /// Wrap an error as a failure of a certificate request for `dn`
    pub(crate) fn certificate_request(dn: impl Into<String>, source: CertdogError) -> Self {
        CertdogError::CertificateRequest {
            dn: dn.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error as a failure of a CSR certificate request
    pub(crate) fn csr_request(issuer: impl Into<String>, source: CertdogError) -> Self {
        CertdogError::CsrRequest {
            issuer: issuer.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error as a failure to revoke `serial`
    pub(crate) fn revocation(serial: impl Into<String>, source: CertdogError) -> Self {
        CertdogError::Revocation {
            serial: serial.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through operation-specific wrappers
    pub fn root(&self) -> &CertdogError {
        match self {
            CertdogError::CertificateRequest { source, .. }
            | CertdogError::CsrRequest { source, .. }
            | CertdogError::Revocation { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status of the underlying API error, if the failure was one
    pub fn api_status(&self) -> Option<StatusCode> {
        match self.root() {
            CertdogError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of the underlying API error, if the failure was one
    pub fn api_body(&self) -> Option<&str> {
        match self.root() {
            CertdogError::Api { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// Whether the failure is a missing session
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self.root(), CertdogError::NotLoggedIn)
    }
}

impl From<serde_json::Error> for CertdogError {
    fn from(err: serde_json::Error) -> Self {
        CertdogError::InvalidResponse(format!("JSON parsing error: {}", err))
    }
}

impl From<anyhow::Error> for CertdogError {
    fn from(err: anyhow::Error) -> Self {
        CertdogError::Config(format!("{:#}", err))
    }
}

/// Result type alias for client operations
pub type CertdogResult<T> = Result<T, CertdogError>;
