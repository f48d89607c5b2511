//! Inbound protocol messages and handshake header material.
//!
//! Wire framing and serialization live with the transport. This module owns
//! the vocabulary of message kinds and the decoded shapes the dispatch
//! layer hands to handlers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::HandshakeError;
use crate::peer::Signer;

/// The inbound message kinds a connection handler must cover.
///
/// Each kind serializes as its stable kebab-case tag (`find-closest`,
/// `hash-list`, ...); wire encoders and decoders share this vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// A peer advertises itself or content it holds.
    Announce,
    /// Request for an entry this node indexes.
    Query,
    /// Closest-nodes lookup toward a target address.
    FindClosest,
    /// Free-text search against the local index.
    Search,
    /// Request for recently indexed entries.
    Recent,
    /// Request for popular entries.
    Popular,
    /// Request for the hash list of a piece collection.
    HashList,
    /// A content piece transfer.
    Piece,
    /// Introduction of another peer.
    AddPeer,
    /// Liveness probe.
    Ping,
}

impl MessageKind {
    /// Every kind, in dispatch order.
    pub const ALL: [MessageKind; 10] = [
        MessageKind::Announce,
        MessageKind::Query,
        MessageKind::FindClosest,
        MessageKind::Search,
        MessageKind::Recent,
        MessageKind::Popular,
        MessageKind::HashList,
        MessageKind::Piece,
        MessageKind::AddPeer,
        MessageKind::Ping,
    ];

    /// The stable wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Announce => "announce",
            MessageKind::Query => "query",
            MessageKind::FindClosest => "find-closest",
            MessageKind::Search => "search",
            MessageKind::Recent => "recent",
            MessageKind::Popular => "popular",
            MessageKind::HashList => "hash-list",
            MessageKind::Piece => "piece",
            MessageKind::AddPeer => "add-peer",
            MessageKind::Ping => "ping",
        }
    }

    /// Look up a kind from its wire tag.
    pub fn from_tag(tag: &str) -> Option<MessageKind> {
        MessageKind::ALL.iter().copied().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound message.
///
/// The payload stays opaque at this layer; handlers interpret it according
/// to the kind. `from` carries the sender identity when the decoder could
/// establish one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Which handler this message routes to.
    pub kind: MessageKind,
    /// Sender address, when known.
    pub from: Option<Address>,
    /// Undecoded message body.
    pub payload: Vec<u8>,
}

impl Message {
    /// A message of `kind` with no sender and an empty payload.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            from: None,
            payload: Vec::new(),
        }
    }
}

/// Identity material negotiated by the transport while setting up a
/// connection.
///
/// The transport performs the byte exchange and collects the pieces here;
/// [`verify_identity`](Self::verify_identity) turns them into a verified
/// [`Address`] during the handshake.
#[derive(Clone, Debug)]
pub struct ConnectionHeader {
    /// The 32-byte public key the remote claims as its identity.
    pub public_key: Vec<u8>,
    /// Challenge bytes this side supplied for the remote to sign.
    pub challenge: Vec<u8>,
    /// The remote's signature over the challenge.
    pub signature: Vec<u8>,
    /// Transport-level endpoint string, kept for diagnostics.
    pub remote: String,
}

impl ConnectionHeader {
    /// Verify the claimed identity and derive its address.
    ///
    /// The key length is checked before anything else, so a malformed key
    /// is rejected without any peer state ever existing for it. The
    /// signature is then verified over the challenge.
    pub fn verify_identity(&self, signer: &dyn Signer) -> Result<Address, HandshakeError> {
        let address = Address::generate(&self.public_key)?;
        if !signer.verify(&self.public_key, &self.challenge, &self.signature) {
            return Err(HandshakeError::SignatureMismatch);
        }
        Ok(address)
    }
}
