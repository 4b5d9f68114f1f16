//! Session token handling

use std::fmt;

use crate::utils::error::{CertdogError, CertdogResult};

/// Where an operation takes its bearer token from
#[derive(Clone, Copy)]
pub enum TokenSource<'a> {
    /// The token stored by [`CertdogClient::login`](crate::CertdogClient::login)
    Session,
    /// A token managed by the caller, e.g. from `login_external`
    Explicit(&'a str),
}

impl fmt::Debug for TokenSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Session => f.write_str("Session"),
            TokenSource::Explicit(_) => f.write_str("Explicit(<redacted>)"),
        }
    }
}

/// Login state of a client: logged in exactly when a token is held
#[derive(Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Drop any held token ahead of a login attempt
    pub(crate) fn reset(&mut self) {
        self.token = None;
    }

    pub(crate) fn store(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Resolve `source` to a bearer token, failing before any I/O when the
    /// session is needed but not logged in
    pub fn resolve<'a>(&'a self, source: TokenSource<'a>) -> CertdogResult<&'a str> {
        match source {
            TokenSource::Session => self.token().ok_or(CertdogError::NotLoggedIn),
            TokenSource::Explicit(token) => Ok(token),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
