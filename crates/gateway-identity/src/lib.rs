//! # gateway-identity
//!
//! certificates, the certificate authority that issues and revokes them
//! through a threshold wallet, and the identity gate that decides whether a
//! presented certificate establishes a trusted identity for a request.

pub mod authority;
pub mod certificate;
pub mod error;
pub mod gate;
pub mod revocation;

#[cfg(test)]
mod test_support;

pub use authority::{CertificateAuthority, IssuedRecord};
pub use certificate::{Certificate, CertificateType};
pub use error::{Error, Result};
pub use gate::{IdentityGate, VerifiedIdentity};
pub use revocation::{ExternalRevocationChecker, LocalRevocationChecker, OverlayLookup, RevocationChecker, RevocationRecord};
