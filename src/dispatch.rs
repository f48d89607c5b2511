//! Connection lifecycle and message dispatch.
//!
//! The transport accepts connections and decodes wire bytes; everything
//! between "header negotiated" and "connection gone" runs through here:
//! the handshake that admits a peer, per-kind routing of decoded messages,
//! and the exactly-once close notification.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::address::Address;
use crate::error::HandshakeError;
use crate::message::{ConnectionHeader, Message, MessageKind};
use crate::peer::NetworkPeer;

/// The surface a connection-handling component implements.
///
/// One small method per inbound kind keeps each independently testable;
/// [`dispatch_message`] routes by kind. An error from a handler marks that
/// one message malformed or unauthorized. The dispatch loop survives it,
/// and the transport decides whether to log, ignore, or drop the
/// connection.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    /// The peer type admitted by a successful handshake.
    type Peer: NetworkPeer;

    /// Admit a connection: verify the header's identity material and bind
    /// the session to a verified address. On failure the connection is
    /// refused and no close notification follows.
    async fn handle_handshake(
        &self,
        header: ConnectionHeader,
    ) -> Result<Self::Peer, HandshakeError>;

    /// A peer's session ended. Fired exactly once per admitted peer by
    /// [`drive_connection`]; implementations must tolerate addresses that
    /// were never admitted.
    fn handle_close_connection(&self, address: &Address);

    /// A peer advertises itself or content it holds.
    async fn handle_announce(&self, message: &Message) -> Result<()>;
    /// A request for an indexed entry.
    async fn handle_query(&self, message: &Message) -> Result<()>;
    /// A closest-nodes lookup toward a target address.
    async fn handle_find_closest(&self, message: &Message) -> Result<()>;
    /// A free-text search against the local index.
    async fn handle_search(&self, message: &Message) -> Result<()>;
    /// A request for recently indexed entries.
    async fn handle_recent(&self, message: &Message) -> Result<()>;
    /// A request for popular entries.
    async fn handle_popular(&self, message: &Message) -> Result<()>;
    /// A request for the hash list of a piece collection.
    async fn handle_hash_list(&self, message: &Message) -> Result<()>;
    /// A content piece transfer.
    async fn handle_piece(&self, message: &Message) -> Result<()>;
    /// An introduction of another peer.
    async fn handle_add_peer(&self, message: &Message) -> Result<()>;
    /// A liveness probe.
    async fn handle_ping(&self, message: &Message) -> Result<()>;
}

/// Route one decoded message to its handler method by kind.
pub async fn dispatch_message<H: ProtocolHandler>(
    handler: &H,
    message: &Message,
) -> Result<()> {
    match message.kind {
        MessageKind::Announce => handler.handle_announce(message).await,
        MessageKind::Query => handler.handle_query(message).await,
        MessageKind::FindClosest => handler.handle_find_closest(message).await,
        MessageKind::Search => handler.handle_search(message).await,
        MessageKind::Recent => handler.handle_recent(message).await,
        MessageKind::Popular => handler.handle_popular(message).await,
        MessageKind::HashList => handler.handle_hash_list(message).await,
        MessageKind::Piece => handler.handle_piece(message).await,
        MessageKind::AddPeer => handler.handle_add_peer(message).await,
        MessageKind::Ping => handler.handle_ping(message).await,
    }
}

/// Supplies decoded inbound messages from one peer's streams.
///
/// The wire decoder implements this. `Ok(None)` means the remote closed
/// the stream cleanly.
#[async_trait]
pub trait MessageSource: Send {
    /// The next decoded message, or `None` at end of stream.
    async fn next_message(&mut self) -> Result<Option<Message>>;
}

/// Lifecycle of a single peer connection.
///
/// A refused handshake jumps straight from `Handshaking` to `Closed`. An
/// admitted peer always passes through `Closing`, where the close
/// notification fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Handshaking,
    Active,
    Closing,
    Closed,
}

/// Drive one connection from handshake to teardown.
///
/// Runs the handshake, then dispatches messages in the order the source
/// yields them until the stream ends or fails. Handler errors are logged
/// and skipped so one bad message cannot take the loop down. However the
/// loop ends, by clean EOF, source failure, or this future being dropped
/// by a cancelled task, the close notification fires exactly once for an
/// admitted peer. A refused handshake admits no peer and notifies nothing.
pub async fn drive_connection<H, S>(
    handler: &H,
    header: ConnectionHeader,
    mut source: S,
) -> Result<()>
where
    H: ProtocolHandler,
    S: MessageSource,
{
    let remote = header.remote.clone();
    let mut state = ConnectionState::Connecting;
    debug!(%remote, ?state, "connection accepted");

    state = ConnectionState::Handshaking;
    debug!(%remote, ?state, "handshaking");

    let peer = match handler.handle_handshake(header).await {
        Ok(peer) => peer,
        Err(err) => {
            state = ConnectionState::Closed;
            debug!(%remote, ?state, "handshake refused: {err}");
            return Err(err.into());
        }
    };

    let address = *peer.address();
    state = ConnectionState::Active;
    debug!(peer = %address, ?state, "peer admitted");

    let mut close = CloseGuard {
        handler,
        address: Some(address),
    };

    loop {
        match source.next_message().await {
            Ok(Some(message)) => {
                if let Err(err) = dispatch_message(handler, &message).await {
                    warn!(
                        peer = %address,
                        kind = %message.kind,
                        "handler rejected message: {err:?}"
                    );
                }
            }
            Ok(None) => break,
            Err(err) => {
                debug!(peer = %address, "message stream failed: {err:?}");
                break;
            }
        }
    }

    state = ConnectionState::Closing;
    debug!(peer = %address, ?state, "closing connection");
    close.notify();
    state = ConnectionState::Closed;
    debug!(peer = %address, ?state, "connection closed");
    Ok(())
}

/// Fires the close notification exactly once, even when the driving future
/// is dropped mid-read.
struct CloseGuard<'a, H: ProtocolHandler> {
    handler: &'a H,
    address: Option<Address>,
}

impl<H: ProtocolHandler> CloseGuard<'_, H> {
    fn notify(&mut self) {
        if let Some(address) = self.address.take() {
            self.handler.handle_close_connection(&address);
        }
    }
}

impl<H: ProtocolHandler> Drop for CloseGuard<'_, H> {
    fn drop(&mut self) {
        self.notify();
    }
}
