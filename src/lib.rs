//! certdog client library
//!
//! Authenticates to a certdog certificate management service and issues,
//! retrieves and revokes X.509 certificates through its REST API.
//!
//! ```no_run
//! use certdog_client::{CertdogClient, DnCertificateRequest, OutputFormat, RevocationReason};
//!
//! # async fn example() -> certdog_client::CertdogResult<()> {
//! let mut client = CertdogClient::from_url("https://certdog.example.com/certdog/api")?;
//! client.login("certdogtest", "password").await?;
//!
//! let teams = client.list_teams().await?;
//! let issuers = client.list_issuers().await?;
//! let generators = client.list_generators().await?;
//!
//! let request = DnCertificateRequest::new(&issuers[0], &generators[0], &teams[0], "CN=client pem test")
//!     .password("password");
//! let payload = client.request_certificate(&request, OutputFormat::Pem).await?;
//! payload.save("certdog.pem")?;
//!
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! A token obtained with [`CertdogClient::login_external`] can be used through
//! [`CertdogClient::with_token`] without storing it in the client.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::CertdogConfig;
pub use models::{
    Certificate, CertificatePayload, CsrCertificateRequest, DnCertificateRequest, OutputFormat,
    RevocationReason, SubjectAltName,
};
pub use services::{Authorized, CertdogClient, TokenSource};
pub use utils::error::{CertdogError, CertdogResult};
