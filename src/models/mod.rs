//! Data models

mod certificate;
mod directory;
mod request;
mod revocation;

pub use certificate::*;
pub use directory::*;
pub use request::*;
pub use revocation::*;
