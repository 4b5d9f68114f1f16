//! certdog API access and local file helpers

pub mod client;
pub mod session;
pub mod storage;

pub use client::{Authorized, CertdogClient};
pub use session::{Session, TokenSource};
pub use storage::{save_cert, save_jks, save_p12, save_pem};
