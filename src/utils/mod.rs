//! Shared helpers

pub mod error;
pub mod pem;
pub mod validation;
