//! Revocation reasons accepted by certdog

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::utils::error::CertdogError;

/// Wire text of each reason, indexed by the reason's code
const REASON_TEXT: [&str; 7] = [
    "unspecified",
    "key compromise",
    "ca compromise",
    "affiliation changed",
    "superseded",
    "cessation of operation",
    "hold",
];

/// Why a certificate is being revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RevocationReason {
    #[default]
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    Hold = 6,
}

impl RevocationReason {
    /// Every reason, in code order
    pub const ALL: [RevocationReason; 7] = [
        RevocationReason::Unspecified,
        RevocationReason::KeyCompromise,
        RevocationReason::CaCompromise,
        RevocationReason::AffiliationChanged,
        RevocationReason::Superseded,
        RevocationReason::CessationOfOperation,
        RevocationReason::Hold,
    ];

    /// Numeric reason code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Text sent to certdog for this reason
    pub fn as_str(self) -> &'static str {
        REASON_TEXT[self as usize]
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RevocationReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl TryFrom<u8> for RevocationReason {
    type Error = CertdogError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| CertdogError::InvalidInput(format!("Unknown revocation reason code: {}", code)))
    }
}

impl FromStr for RevocationReason {
    type Err = CertdogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        REASON_TEXT
            .iter()
            .position(|text| *text == wanted)
            .map(|index| Self::ALL[index])
            .ok_or_else(|| CertdogError::InvalidInput(format!("Unknown revocation reason: {}", s)))
    }
}
