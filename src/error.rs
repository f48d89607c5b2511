//! Error types surfaced by the identity and dispatch layers.

use thiserror::Error;

/// Failures producing or ingesting an [`Address`](crate::Address).
#[derive(Debug, Error)]
pub enum AddressError {
    /// The public key handed to address generation was not 32 bytes.
    #[error("public key must be exactly 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    /// A raw byte payload was not exactly 20 bytes.
    #[error("address payload must be exactly 20 bytes, got {0}")]
    LengthMismatch(usize),
    /// The textual form failed base58check validation.
    #[error("malformed address encoding")]
    Decode(#[source] bs58::decode::Error),
}

/// A peer address that could not be resolved to a reachable node.
///
/// Carries the attempted address string so operators can see which lookup
/// failed. The operation that produced this error is abandoned, never
/// retried internally.
#[derive(Debug, Clone, Error)]
#[error("failed to resolve address `{address}`")]
pub struct AddressResolutionError {
    /// The address string that failed to resolve.
    pub address: String,
}

impl AddressResolutionError {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Why a connection was refused during the handshake step.
///
/// A refused handshake means the remote was never admitted as a peer: no
/// peer state exists and no close notification will fire for the attempt.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The presented identity material was unusable.
    #[error(transparent)]
    Identity(#[from] AddressError),
    /// The peer's claimed address could not be resolved.
    #[error(transparent)]
    Resolution(#[from] AddressResolutionError),
    /// The handshake signature does not verify against the presented key.
    #[error("handshake signature does not match the presented key")]
    SignatureMismatch,
    /// The connection header was structurally invalid.
    #[error("malformed connection header: {0}")]
    MalformedHeader(String),
}
