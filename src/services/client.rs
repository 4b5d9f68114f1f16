//! certdog API client
//!
//! [`CertdogClient`] owns the HTTP connection and the optional session token.
//! Every API operation is implemented once on [`Authorized`], a view of the
//! client bound to a resolved bearer token. [`CertdogClient::session`] binds
//! the stored token (failing with `NotLoggedIn` before any request) and
//! [`CertdogClient::with_token`] binds a caller-managed one.
//!
//! Calls are sequential: each operation awaits at most two round-trips and
//! nothing is retried. `login` and `logout` take `&mut self`, so one
//! instance cannot log in and out concurrently.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::CertdogConfig;
use crate::models::{
    Certificate, CertificatePayload, CsrCertificateRequest, CsrIssueResponse,
    DnCertificateRequest, Generator, IssueResponse, IssuerEntry, LoginRequest, LoginResponse,
    OutputFormat, RevocationReason, RevokeRequest, Team,
};
use crate::services::session::{Session, TokenSource};
use crate::utils::error::{CertdogError, CertdogResult};
use crate::utils::validation::{normalize_serial, validate_serial_hex};

/// API paths, relative to the configured base URL
mod endpoints {
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logouthere";
    pub const MY_TEAMS: &str = "currentuser/myteams";
    pub const MY_ISSUERS: &str = "currentuser/myissuers";
    pub const CSR_GENERATORS: &str = "admin/generators";
    pub const CERT_REQUEST: &str = "certs/request";
    pub const CERT_REQUEST_CSR: &str = "certs/requestp10";
    pub const REVOKE_CERT: &str = "certs/revoke";

    pub fn cert_jks(id: &str) -> String {
        format!("certs/{}/jks", urlencoding::encode(id))
    }

    pub fn cert_pem(id: &str) -> String {
        format!("certs/{}/pem", urlencoding::encode(id))
    }

    pub fn issuer_chain(issuer: &str) -> String {
        format!("admin/ca/chainbyname/{}", urlencoding::encode(issuer))
    }
}

/// certdog API client
#[derive(Debug)]
pub struct CertdogClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl CertdogClient {
    /// Create a new client from configuration
    pub fn new(config: &CertdogConfig) -> CertdogResult<Self> {
        config.validate()?;
        info!("Initializing certdog client for {}", config.url);

        let mut builder = Client::builder();

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(ref ca_path) = config.ssl_ca {
            let ca_pem = std::fs::read(ca_path).map_err(|e| {
                CertdogError::Config(format!("Failed to read CA bundle {:?}: {}", ca_path, e))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&ca_pem).map_err(|e| {
                CertdogError::Config(format!("Failed to parse CA bundle {:?}: {}", ca_path, e))
            })?;
            debug!("Trusting {} certificate(s) from {:?}", certs.len(), ca_path);
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if !config.ssl_verify {
            warn!("SSL certificate verification is DISABLED - this is insecure!");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| CertdogError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            session: Session::default(),
        })
    }

    /// Create a client for `url` with default settings
    pub fn from_url(url: impl Into<String>) -> CertdogResult<Self> {
        Self::new(&CertdogConfig::new(url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    // ==================== Session ====================

    /// Log in and keep the returned token for session-mode calls
    ///
    /// Any previous session is dropped first, so a failed login always
    /// leaves the client logged out.
    pub async fn login(&mut self, username: &str, password: &str) -> CertdogResult<()> {
        self.session.reset();
        let token = self.authenticate(username, password).await?;
        self.session.store(token);
        info!(username, "Logged in to certdog");
        Ok(())
    }

    /// Log in and hand the token to the caller; the session is left untouched
    pub async fn login_external(&self, username: &str, password: &str) -> CertdogResult<String> {
        let token = self.authenticate(username, password).await?;
        info!(username, "Obtained certdog token");
        Ok(token)
    }

    /// End the stored session; a no-op when not logged in
    pub async fn logout(&mut self) -> CertdogResult<()> {
        let Some(token) = self.session.token() else {
            debug!("Logout requested without a session");
            return Ok(());
        };
        self.end_session(token).await?;
        self.session.reset();
        Ok(())
    }

    /// End the session identified by a caller-managed token
    pub async fn logout_token(&self, token: &str) -> CertdogResult<()> {
        self.end_session(token).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> CertdogResult<String> {
        let request = self
            .client
            .post(self.url(endpoints::LOGIN))
            .json(&LoginRequest { username, password });

        let response: LoginResponse = self
            .execute_json(request, endpoints::LOGIN)
            .await
            .map_err(|e| CertdogError::Authentication(e.to_string()))?;

        if response.token.is_empty() {
            return Err(CertdogError::Authentication(
                "No token in login response".to_string(),
            ));
        }
        Ok(response.token)
    }

    async fn end_session(&self, token: &str) -> CertdogResult<()> {
        let request = self.client.get(self.url(endpoints::LOGOUT)).bearer_auth(token);
        self.execute(request, endpoints::LOGOUT).await?;
        info!("Logged out of certdog");
        Ok(())
    }

    // ==================== Token binding ====================

    /// Operations using the stored session token
    pub fn session(&self) -> CertdogResult<Authorized<'_>> {
        self.authorize(TokenSource::Session)
    }

    /// Operations using a caller-managed token; no login needed
    pub fn with_token<'a>(&'a self, token: &'a str) -> Authorized<'a> {
        Authorized {
            client: self,
            token,
        }
    }

    /// Operations using the token `source` resolves to
    pub fn authorize<'a>(&'a self, source: TokenSource<'a>) -> CertdogResult<Authorized<'a>> {
        let token = self.session.resolve(source)?;
        Ok(self.with_token(token))
    }

    // ==================== Session-mode shortcuts ====================

    /// Names of the teams the logged in user belongs to
    pub async fn list_teams(&self) -> CertdogResult<Vec<String>> {
        self.session()?.list_teams().await
    }

    /// Names of the issuers the logged in user may request from
    pub async fn list_issuers(&self) -> CertdogResult<Vec<String>> {
        self.session()?.list_issuers().await
    }

    /// Names of the available CSR generators
    pub async fn list_generators(&self) -> CertdogResult<Vec<String>> {
        self.session()?.list_generators().await
    }

    /// Request a certificate from a DN, see [`Authorized::request_certificate`]
    pub async fn request_certificate(
        &self,
        request: &DnCertificateRequest,
        format: OutputFormat,
    ) -> CertdogResult<CertificatePayload> {
        self.session()?.request_certificate(request, format).await
    }

    /// Request a certificate from a CSR
    pub async fn request_certificate_from_csr(
        &self,
        request: &CsrCertificateRequest,
    ) -> CertdogResult<Certificate> {
        self.session()?.request_certificate_from_csr(request).await
    }

    /// Certificate chain of an issuer, in server order
    pub async fn get_issuer_chain(&self, issuer: &str) -> CertdogResult<Vec<Certificate>> {
        self.session()?.get_issuer_chain(issuer).await
    }

    /// Revoke a certificate by serial number
    pub async fn revoke_certificate(
        &self,
        issuer: &str,
        serial_hex: &str,
        reason: RevocationReason,
    ) -> CertdogResult<()> {
        self.session()?
            .revoke_certificate(issuer, serial_hex, reason)
            .await
    }

    /// Revoke a certificate using its own serial number
    pub async fn revoke_certificate_by_cert(
        &self,
        issuer: &str,
        certificate: &Certificate,
        reason: RevocationReason,
    ) -> CertdogResult<()> {
        self.session()?
            .revoke_certificate_by_cert(issuer, certificate, reason)
            .await
    }

    // ==================== HTTP helpers ====================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request; anything but 200 OK becomes an API error carrying the body
    async fn execute(&self, request: RequestBuilder, path: &str) -> CertdogResult<Response> {
        debug!("certdog: sending request to {}", path);
        let response = request.send().await.map_err(|e| {
            error!(
                "certdog: request to {} failed: {} (is_connect: {}, is_timeout: {})",
                path,
                e,
                e.is_connect(),
                e.is_timeout()
            );
            CertdogError::Transport(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("certdog: failed to read error body from {}: {}", path, e);
                    format!("<unreadable body: {}>", e)
                }
            };
            warn!("certdog: {} returned status {}", path, status);
            return Err(CertdogError::Api { status, body });
        }
        Ok(response)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> CertdogResult<T> {
        let body = self.execute(request, path).await?.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            // Truncate body for logging if too long
            let truncated = if body.len() > 500 {
                format!("{}... (truncated)", body.chars().take(500).collect::<String>())
            } else {
                body
            };
            CertdogError::InvalidResponse(format!(
                "Failed to parse response from {}: {}: {}",
                path, e, truncated
            ))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> CertdogResult<T> {
        let request = self.client.get(self.url(path)).bearer_auth(token);
        self.execute_json(request, path).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> CertdogResult<T> {
        let request = self.client.post(self.url(path)).bearer_auth(token).json(body);
        self.execute_json(request, path).await
    }

    /// GET a text payload; a JSON string literal body is unquoted
    async fn get_text(&self, token: &str, path: &str) -> CertdogResult<String> {
        let request = self.client.get(self.url(path)).bearer_auth(token);
        let body = self.execute(request, path).await?.text().await?;
        Ok(serde_json::from_str::<String>(&body).unwrap_or(body))
    }

    async fn post_unit<B: Serialize + ?Sized>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> CertdogResult<()> {
        let request = self.client.post(self.url(path)).bearer_auth(token).json(body);
        self.execute(request, path).await?;
        Ok(())
    }
}

/// API operations bound to a bearer token
#[derive(Clone, Copy)]
pub struct Authorized<'a> {
    client: &'a CertdogClient,
    token: &'a str,
}

impl std::fmt::Debug for Authorized<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("base_url", &self.client.base_url)
            .finish_non_exhaustive()
    }
}

impl<'a> Authorized<'a> {
    // ==================== Listings ====================

    /// Names of the teams the token's user belongs to, in server order
    pub async fn list_teams(&self) -> CertdogResult<Vec<String>> {
        let teams: Vec<Team> = self.client.get_json(self.token, endpoints::MY_TEAMS).await?;
        Ok(teams.into_iter().map(|team| team.name).collect())
    }

    /// Names of the issuers the token's user may request from, in server order
    pub async fn list_issuers(&self) -> CertdogResult<Vec<String>> {
        let issuers: Vec<IssuerEntry> = self
            .client
            .get_json(self.token, endpoints::MY_ISSUERS)
            .await?;
        Ok(issuers
            .into_iter()
            .map(|issuer| match issuer {
                IssuerEntry::Name(name) | IssuerEntry::Record { name, .. } => name,
            })
            .collect())
    }

    /// Names of the CSR generators, in server order
    pub async fn list_generators(&self) -> CertdogResult<Vec<String>> {
        let generators: Vec<Generator> = self
            .client
            .get_json(self.token, endpoints::CSR_GENERATORS)
            .await?;
        Ok(generators.into_iter().map(|generator| generator.name).collect())
    }

    // ==================== Issuance ====================

    /// Request a certificate for a DN, built by one of certdog's CSR generators
    ///
    /// certdog always issues PKCS12 first. For JKS or PEM a second call,
    /// keyed by the returned id, fetches the converted payload. Failure of
    /// either step fails the whole request.
    pub async fn request_certificate(
        &self,
        request: &DnCertificateRequest,
        format: OutputFormat,
    ) -> CertdogResult<CertificatePayload> {
        self.issue_from_dn(request, format)
            .await
            .map_err(|e| CertdogError::certificate_request(&request.dn, e))
    }

    async fn issue_from_dn(
        &self,
        request: &DnCertificateRequest,
        format: OutputFormat,
    ) -> CertdogResult<CertificatePayload> {
        request.validate()?;
        info!(
            dn = %request.dn,
            issuer = %request.issuer,
            %format,
            "Requesting certificate"
        );

        let issued: IssueResponse = self
            .client
            .post_json(self.token, endpoints::CERT_REQUEST, request)
            .await?;
        if issued.id.is_empty() {
            return Err(CertdogError::InvalidResponse(
                "Certificate id missing from response".to_string(),
            ));
        }

        let data = match format {
            OutputFormat::Pkcs12 => {
                if issued.p12_data.is_empty() {
                    return Err(CertdogError::InvalidResponse(
                        "PKCS12 data missing from response".to_string(),
                    ));
                }
                issued.p12_data
            }
            OutputFormat::Jks | OutputFormat::Pem => {
                let path = match format {
                    OutputFormat::Jks => endpoints::cert_jks(&issued.id),
                    _ => endpoints::cert_pem(&issued.id),
                };
                let converted = self.client.get_text(self.token, &path).await?;
                if converted.trim().is_empty() {
                    return Err(CertdogError::InvalidResponse(format!(
                        "{} data missing from response",
                        format
                    )));
                }
                converted
            }
        };

        info!(id = %issued.id, %format, "Certificate issued");
        Ok(CertificatePayload {
            id: issued.id,
            format,
            data,
        })
    }

    /// Request a certificate for a caller-generated CSR
    pub async fn request_certificate_from_csr(
        &self,
        request: &CsrCertificateRequest,
    ) -> CertdogResult<Certificate> {
        self.issue_from_csr(request)
            .await
            .map_err(|e| CertdogError::csr_request(&request.issuer, e))
    }

    async fn issue_from_csr(&self, request: &CsrCertificateRequest) -> CertdogResult<Certificate> {
        request.validate()?;
        info!(issuer = %request.issuer, "Requesting certificate from CSR");

        let issued: CsrIssueResponse = self
            .client
            .post_json(self.token, endpoints::CERT_REQUEST_CSR, request)
            .await?;
        let certificate = Certificate::from_pem(&issued.pem_cert)?;

        info!(
            id = %issued.id,
            subject = %certificate.subject(),
            "Certificate issued from CSR"
        );
        Ok(certificate)
    }

    /// Certificate chain of `issuer`, parsed, in the order the server returned it
    pub async fn get_issuer_chain(&self, issuer: &str) -> CertdogResult<Vec<Certificate>> {
        let chain: Vec<String> = self
            .client
            .get_json(self.token, &endpoints::issuer_chain(issuer))
            .await?;
        chain
            .iter()
            .enumerate()
            .map(|(index, pem)| {
                Certificate::from_pem(pem).map_err(|e| {
                    let detail = match e {
                        CertdogError::CertificateFormat(detail) => detail,
                        other => other.to_string(),
                    };
                    CertdogError::CertificateFormat(format!(
                        "Chain entry {} of issuer '{}': {}",
                        index, issuer, detail
                    ))
                })
            })
            .collect()
    }

    // ==================== Revocation ====================

    /// Revoke the certificate with serial `serial_hex` (ASCII hex, `0x` optional)
    pub async fn revoke_certificate(
        &self,
        issuer: &str,
        serial_hex: &str,
        reason: RevocationReason,
    ) -> CertdogResult<()> {
        let serial = normalize_serial(serial_hex);
        self.revoke(issuer, &serial, reason)
            .await
            .map_err(|e| CertdogError::revocation(&serial, e))
    }

    /// Revoke `certificate`, identified by its serial number
    pub async fn revoke_certificate_by_cert(
        &self,
        issuer: &str,
        certificate: &Certificate,
        reason: RevocationReason,
    ) -> CertdogResult<()> {
        self.revoke_certificate(issuer, certificate.serial_number(), reason)
            .await
    }

    async fn revoke(&self, issuer: &str, serial: &str, reason: RevocationReason) -> CertdogResult<()> {
        if issuer.trim().is_empty() {
            return Err(CertdogError::InvalidInput("issuer must not be empty".to_string()));
        }
        if !validate_serial_hex(serial) {
            return Err(CertdogError::InvalidInput(format!(
                "Serial number must be ASCII hex: '{}'",
                serial
            )));
        }

        let body = RevokeRequest {
            ca_name: issuer,
            serial_number: serial,
            reason,
        };
        self.client
            .post_unit(self.token, endpoints::REVOKE_CERT, &body)
            .await?;

        info!(serial, issuer, %reason, "Certificate revoked");
        Ok(())
    }
}
