//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex for a certificate serial number in ASCII hex
static SERIAL_HEX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").unwrap());

/// Regex for a notification or SAN e-mail address
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Regex for a subject alternative name in `TYPE:value` form
static SAN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(DNS|EMAIL|IP):(\S+)$").unwrap());

/// Normalize a serial number to bare hex, dropping a `0x` prefix and
/// surrounding whitespace
pub fn normalize_serial(serial: &str) -> String {
    let trimmed = serial.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_string()
}

/// Validate a serial number already passed through [`normalize_serial`]
pub fn validate_serial_hex(serial: &str) -> bool {
    serial.len() <= 128 && SERIAL_HEX_REGEX.is_match(serial)
}

/// Validate an e-mail address
pub fn validate_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate a subject alternative name string (`DNS:`, `EMAIL:` or `IP:`)
pub fn validate_subject_alt_name(san: &str) -> bool {
    SAN_REGEX.is_match(san)
}
