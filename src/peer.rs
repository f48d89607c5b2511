//! Capability seams between this core and its collaborators: the
//! transport-owned session and the key-management signer.

use crate::address::Address;

/// A connected peer: a verified address bound to a transport-owned session.
///
/// The peer is a thin, non-owning facade. The session's lifecycle belongs
/// to the transport; this core holds a reference, never assumes exclusive
/// mutation rights over it, and learns about termination through the
/// close notification on [`ProtocolHandler`](crate::ProtocolHandler).
pub trait NetworkPeer: Send + Sync {
    /// The transport's multiplexed session handle.
    type Session;
    /// One logical stream within the session.
    type Stream;

    /// The underlying multiplexed session.
    fn session(&self) -> &Self::Session;

    /// Attach an additional logical stream to the session, e.g. for
    /// parallel piece transfers. May be called concurrently from several
    /// tasks.
    fn add_stream(&self, stream: Self::Stream);

    /// The peer's verified identity.
    fn address(&self) -> &Address;
}

/// Signing capability supplied by the identity layer.
///
/// Handlers receive a signer at construction time instead of inheriting
/// signing behavior, which keeps message handling testable with a stub.
pub trait Signer: Send + Sync {
    /// The local public key.
    fn public_key(&self) -> &[u8];

    /// Sign outbound protocol data.
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// Verify `signature` over `data` against `public_key`.
    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool;
}
