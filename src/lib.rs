//! # dhtkit
//!
//! This crate is the identity and protocol-dispatch core of a
//! Kademlia-style peer-to-peer DHT. It owns the pieces every other layer
//! of a node builds on: stable 160-bit addresses with the XOR metric and
//! bucket indexing that routing tables organize peers by, the
//! handshake-and-dispatch contract a multiplexed transport drives inbound
//! connections through, and a deferred-error reader for parsing delimited
//! protocol fields.
//!
//! Routing-table storage, wire serialization, the transport itself, and
//! content storage are collaborators behind narrow trait seams, not
//! residents of this crate.
//!
//! The crate is split into a handful of modules that can be reused
//! independently:
//!
//! - [`address`]: [`Address`] generation from public keys, the canonical
//!   base58check text form, and [`Distance`] with bucket indexing.
//! - [`message`]: [`MessageKind`] tags, decoded [`Message`] values, and
//!   the [`ConnectionHeader`] handshake material.
//! - [`peer`]: the [`NetworkPeer`] and [`Signer`] capability seams.
//! - [`dispatch`]: the [`ProtocolHandler`] contract, [`dispatch_message`]
//!   routing, and the [`drive_connection`] lifecycle driver.
//! - [`reader`]: [`DeferredReader`], delimited reads with a latched error.
//! - [`error`]: the error types the layers above match on.
//!
//! ## Getting started
//!
//! Addresses are plain values derived from public keys; everything else
//! hangs off them:
//!
//! ```
//! use dhtkit::Address;
//!
//! let addr = Address::generate(&[0x01; 32])?;
//! let text = addr.to_string();
//! assert_eq!(text.parse::<Address>()?, addr);
//!
//! let other = Address::generate(&[0x02; 32])?;
//! let bucket = addr.distance(&other).bucket_index();
//! assert!(bucket <= dhtkit::MAX_BUCKET_INDEX);
//! # Ok::<(), dhtkit::AddressError>(())
//! ```
//!
//! A transport admits connections by collecting a [`ConnectionHeader`],
//! then handing it together with a [`MessageSource`] to
//! [`drive_connection`], which performs the handshake against a
//! [`ProtocolHandler`] and routes each decoded message to the matching
//! handler method.

pub mod address;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod peer;
pub mod reader;

pub use address::{
    Address, Distance, ADDRESS_LEN, ADDRESS_VERSION, MAX_BUCKET_INDEX, PUBLIC_KEY_LEN,
};
pub use dispatch::{
    dispatch_message, drive_connection, ConnectionState, MessageSource, ProtocolHandler,
};
pub use error::{AddressError, AddressResolutionError, HandshakeError};
pub use message::{ConnectionHeader, Message, MessageKind};
pub use peer::{NetworkPeer, Signer};
pub use reader::DeferredReader;
