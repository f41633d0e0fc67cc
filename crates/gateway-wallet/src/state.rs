//! the DKG / restore lifecycle state machine

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletState {
    Uninitialized,
    Bootstrapping,
    Participating,
    Ready,
    /// fewer than the threshold of cosigners are currently reachable;
    /// signing is refused but reads (public key, verify) still work
    Degraded { reachable: usize, threshold: usize },
}

impl fmt::Display for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletState::Uninitialized => write!(f, "uninitialized"),
            WalletState::Bootstrapping => write!(f, "bootstrapping"),
            WalletState::Participating => write!(f, "participating"),
            WalletState::Ready => write!(f, "ready"),
            WalletState::Degraded { reachable, threshold } => {
                write!(f, "degraded({reachable}/{threshold})")
            }
        }
    }
}

impl WalletState {
    pub fn can_sign(&self) -> bool {
        matches!(self, WalletState::Ready)
    }
}
