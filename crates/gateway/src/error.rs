//! the stable error vocabulary every inbound request is eventually mapped
//! to, independent of which component crate raised the underlying fault,
//! plus the four user-visible message buckets that vocabulary collapses
//! into at the edge

use thiserror::Error;

/// the external error-kind vocabulary: every failure surfaced to a caller,
/// or recorded against a dropped message in the audit log, is one of these
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCertificate,
    UntrustedIssuer,
    CertificateExpired,
    Revoked,
    RevocationUnknown,
    SessionUnknown,
    SessionExpired,
    TimingAnomaly,
    BadSignature,
    Replay,
    Decryption,
    CiphertextTampered,
    InsufficientFunds,
    ThresholdUnavailable,
    ShareMismatch,
    Cancelled,
    StorageIO,
    MessagingIO,
    CommitmentIO,
    PolicyDenied,
    QuotaExceeded,
    InternalInvariant,
}

impl ErrorKind {
    /// crypto and policy failures are surfaced under their own name; wallet
    /// and storage failures are rare enough to deserve their own retry
    /// signal; everything else collapses to "internal error" plus an
    /// opaque audit reference the operator can look up
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidCertificate
            | ErrorKind::UntrustedIssuer
            | ErrorKind::CertificateExpired
            | ErrorKind::BadSignature => "identity not verified",
            ErrorKind::Revoked => "access revoked",
            ErrorKind::ThresholdUnavailable | ErrorKind::StorageIO | ErrorKind::MessagingIO => {
                "wallet unavailable, retry"
            }
            _ => "internal error",
        }
    }

    /// whether this kind is retryable transient IO rather than a durable
    /// crypto or policy verdict
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::StorageIO | ErrorKind::MessagingIO | ErrorKind::CommitmentIO)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("wallet error: {0}")]
    Wallet(#[from] gateway_wallet::Error),
    #[error("identity error: {0}")]
    Identity(#[from] gateway_identity::Error),
    #[error("session error: {0}")]
    Session(#[from] gateway_session::Error),
    #[error("encryption error: {0}")]
    Encryption(#[from] gateway_encryption::Error),
    #[error("vault error: {0}")]
    Vault(#[from] gateway_vault::Error),
    #[error("audit error: {0}")]
    Audit(#[from] gateway_audit::Error),
    #[error("messaging error: {0}")]
    Messaging(#[from] gateway_messaging::Error),
    #[error("agent error: {0}")]
    Agent(#[from] gateway_agent::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// maps every component error onto the external vocabulary; an
    /// unrecognized or genuinely-impossible variant maps to
    /// `InternalInvariant` rather than panicking — the request is
    /// terminated and audited, the process stays up
    pub fn kind(&self) -> ErrorKind {
        use gateway_identity::Error as IdErr;
        use gateway_session::Error as SessErr;
        use gateway_encryption::Error as EncErr;
        use gateway_vault::Error as VaultErr;
        use gateway_wallet::Error as WalletErr;
        use gateway_audit::Error as AuditErr;
        use gateway_messaging::Error as MsgErr;

        match self {
            Error::Identity(IdErr::BadSignature) => ErrorKind::InvalidCertificate,
            Error::Identity(IdErr::UntrustedIssuer) => ErrorKind::UntrustedIssuer,
            Error::Identity(IdErr::NotYetValid) | Error::Identity(IdErr::Expired) => ErrorKind::CertificateExpired,
            Error::Identity(IdErr::Revoked(_)) => ErrorKind::Revoked,
            Error::Identity(IdErr::RevocationUnknown) => ErrorKind::RevocationUnknown,
            Error::Identity(_) => ErrorKind::InternalInvariant,

            Error::Session(SessErr::UnknownSession) => ErrorKind::SessionUnknown,
            Error::Session(SessErr::SessionExpired) => ErrorKind::SessionExpired,
            Error::Session(SessErr::TimingAnomaly) | Error::Session(SessErr::ReplayWindowExceeded) => {
                ErrorKind::TimingAnomaly
            }
            Error::Session(SessErr::BadSignature) => ErrorKind::BadSignature,
            Error::Session(SessErr::Unverified) => ErrorKind::SessionUnknown,

            Error::Encryption(EncErr::BadSignature) => ErrorKind::BadSignature,
            Error::Encryption(EncErr::Replay(_)) => ErrorKind::Replay,
            Error::Encryption(EncErr::CiphertextTampered) => ErrorKind::CiphertextTampered,
            Error::Encryption(EncErr::Decryption) => ErrorKind::Decryption,
            Error::Encryption(_) => ErrorKind::InternalInvariant,

            Error::Wallet(WalletErr::InsufficientFunds) => ErrorKind::InsufficientFunds,
            Error::Wallet(WalletErr::ThresholdUnavailable) | Error::Wallet(WalletErr::Timeout) => {
                ErrorKind::ThresholdUnavailable
            }
            Error::Wallet(WalletErr::ShareMismatch | WalletErr::ShareDecryptionFailed) => ErrorKind::ShareMismatch,
            Error::Wallet(WalletErr::Network(_)) => ErrorKind::MessagingIO,
            Error::Wallet(WalletErr::NotAuthorized) => ErrorKind::PolicyDenied,
            Error::Wallet(_) => ErrorKind::InternalInvariant,

            Error::Vault(VaultErr::Storage(_)) => ErrorKind::StorageIO,
            Error::Vault(VaultErr::NotPermitted(_)) => ErrorKind::PolicyDenied,
            Error::Vault(VaultErr::Wallet(inner)) => Error::Wallet(clone_wallet_err(inner)).kind(),
            Error::Vault(_) => ErrorKind::InternalInvariant,

            Error::Audit(AuditErr::BadSignature) => ErrorKind::InvalidCertificate,
            Error::Audit(AuditErr::Commitment(_)) => ErrorKind::CommitmentIO,
            Error::Audit(_) => ErrorKind::InternalInvariant,

            Error::Messaging(MsgErr::Transport(_)) => ErrorKind::MessagingIO,
            Error::Messaging(_) => ErrorKind::InternalInvariant,

            Error::Agent(_) => ErrorKind::InternalInvariant,
            Error::Config(_) | Error::Io(_) => ErrorKind::InternalInvariant,
        }
    }
}

/// `gateway_wallet::Error` does not implement `Clone`; the variants this
/// module actually distinguishes on are reconstructed by hand rather than
/// dragging a derive through a crate whose other call sites have no use
/// for it
fn clone_wallet_err(err: &gateway_wallet::Error) -> gateway_wallet::Error {
    use gateway_wallet::Error as W;
    match err {
        W::InsufficientFunds => W::InsufficientFunds,
        W::ThresholdUnavailable => W::ThresholdUnavailable,
        W::Timeout => W::Timeout,
        W::ShareMismatch => W::ShareMismatch,
        W::ShareDecryptionFailed => W::ShareDecryptionFailed,
        W::Network(s) => W::Network(s.clone()),
        W::NotAuthorized => W::NotAuthorized,
        _ => W::Uninitialized,
    }
}
