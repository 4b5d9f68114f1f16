//! Listing records: teams, issuers and CSR generators
//!
//! Only `name` is surfaced by the client; the remaining attributes are kept
//! as raw JSON.

use serde::{Deserialize, Serialize};

/// A team the current user belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// A CSR generator (key type and DN template used for DN requests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// An issuer as listed by `currentuser/myissuers`
///
/// The service returns bare names; full records are accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuerEntry {
    Name(String),
    Record {
        name: String,
        #[serde(flatten)]
        details: serde_json::Map<String, serde_json::Value>,
    },
}

impl IssuerEntry {
    pub fn name(&self) -> &str {
        match self {
            IssuerEntry::Name(name) => name,
            IssuerEntry::Record { name, .. } => name,
        }
    }
}
