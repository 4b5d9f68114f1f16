//! Request and response bodies exchanged with the certdog API

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::models::RevocationReason;
use crate::utils::error::{CertdogError, CertdogResult};
use crate::utils::validation::{validate_email, validate_subject_alt_name};

/// A subject alternative name, sent as `TYPE:value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectAltName {
    Dns(String),
    Email(String),
    Ip(IpAddr),
}

impl fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectAltName::Dns(name) => write!(f, "DNS:{}", name),
            SubjectAltName::Email(email) => write!(f, "EMAIL:{}", email),
            SubjectAltName::Ip(ip) => write!(f, "IP:{}", ip),
        }
    }
}

/// Request for a certificate built by certdog from a DN and a CSR generator
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnCertificateRequest {
    /// Issuer that signs the request
    #[serde(rename = "caName")]
    pub issuer: String,
    /// CSR generator used to create the key pair and CSR
    #[serde(rename = "csrGeneratorName")]
    pub generator: String,
    /// Team the certificate belongs to
    pub team_name: String,
    /// Requested subject DN
    pub dn: String,
    /// Password protecting the returned PKCS12/JKS/PEM
    #[serde(rename = "p12Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Subject alternative names, each `DNS:`, `EMAIL:` or `IP:`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,
    /// Free text stored with the certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
    /// Additional recipients of issue and renewal e-mails
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_emails: Vec<String>,
}

impl DnCertificateRequest {
    pub fn new(
        issuer: impl Into<String>,
        generator: impl Into<String>,
        team_name: impl Into<String>,
        dn: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            generator: generator.into(),
            team_name: team_name.into(),
            dn: dn.into(),
            password: None,
            subject_alt_names: vec![],
            extra_info: None,
            extra_emails: vec![],
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn subject_alt_name(mut self, san: SubjectAltName) -> Self {
        self.subject_alt_names.push(san.to_string());
        self
    }

    /// Add SANs already in `TYPE:value` form
    pub fn subject_alt_names<I, S>(mut self, sans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subject_alt_names.extend(sans.into_iter().map(Into::into));
        self
    }

    pub fn extra_info(mut self, info: impl Into<String>) -> Self {
        self.extra_info = Some(info.into());
        self
    }

    pub fn extra_email(mut self, email: impl Into<String>) -> Self {
        self.extra_emails.push(email.into());
        self
    }

    /// Check the request locally before it is sent
    pub fn validate(&self) -> CertdogResult<()> {
        require("issuer", &self.issuer)?;
        require("generator", &self.generator)?;
        require("team", &self.team_name)?;
        require("DN", &self.dn)?;

        if let Some(san) = self
            .subject_alt_names
            .iter()
            .find(|san| !validate_subject_alt_name(san))
        {
            return Err(CertdogError::InvalidInput(format!(
                "Subject alternative name must be DNS:, EMAIL: or IP:, got '{}'",
                san
            )));
        }
        validate_emails(&self.extra_emails)
    }
}

impl fmt::Debug for DnCertificateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnCertificateRequest")
            .field("issuer", &self.issuer)
            .field("generator", &self.generator)
            .field("team_name", &self.team_name)
            .field("dn", &self.dn)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("subject_alt_names", &self.subject_alt_names)
            .field("extra_info", &self.extra_info)
            .field("extra_emails", &self.extra_emails)
            .finish()
    }
}

/// Request for a certificate from a caller-generated CSR
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrCertificateRequest {
    /// Issuer that signs the request
    #[serde(rename = "caName")]
    pub issuer: String,
    /// Team the certificate belongs to
    pub team_name: String,
    /// PEM encoded PKCS#10 request
    pub csr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_emails: Vec<String>,
}

impl CsrCertificateRequest {
    pub fn new(
        issuer: impl Into<String>,
        team_name: impl Into<String>,
        csr: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            team_name: team_name.into(),
            csr: csr.into(),
            extra_info: None,
            extra_emails: vec![],
        }
    }

    pub fn extra_info(mut self, info: impl Into<String>) -> Self {
        self.extra_info = Some(info.into());
        self
    }

    pub fn extra_email(mut self, email: impl Into<String>) -> Self {
        self.extra_emails.push(email.into());
        self
    }

    /// Check the request locally before it is sent
    pub fn validate(&self) -> CertdogResult<()> {
        require("issuer", &self.issuer)?;
        require("team", &self.team_name)?;
        require("CSR", &self.csr)?;
        validate_emails(&self.extra_emails)
    }
}

/// Body of `certs/revoke`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RevokeRequest<'a> {
    pub ca_name: &'a str,
    pub serial_number: &'a str,
    pub reason: RevocationReason,
}

/// Body of `login`
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

/// Response of `certs/request`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IssueResponse {
    pub id: String,
    #[serde(default)]
    pub p12_data: String,
}

/// Response of `certs/requestp10`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CsrIssueResponse {
    #[serde(default)]
    pub id: String,
    pub pem_cert: String,
}

fn require(field: &str, value: &str) -> CertdogResult<()> {
    if value.trim().is_empty() {
        return Err(CertdogError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn validate_emails(emails: &[String]) -> CertdogResult<()> {
    match emails.iter().find(|email| !validate_email(email)) {
        Some(email) => Err(CertdogError::InvalidInput(format!(
            "Invalid e-mail address: '{}'",
            email
        ))),
        None => Ok(()),
    }
}
