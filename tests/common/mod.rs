use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use dhtkit::{
    Address, AddressResolutionError, ConnectionHeader, HandshakeError, Message, MessageKind,
    MessageSource, NetworkPeer, ProtocolHandler, Signer,
};

/// Deterministic stand-in for a real signature scheme: a signature is the
/// key and the data glued together, so tampering with either breaks
/// verification.
pub fn stub_signature(public_key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut sig = b"stub-sig:".to_vec();
    sig.extend_from_slice(public_key);
    sig.extend_from_slice(data);
    sig
}

pub struct StubSigner {
    public: Vec<u8>,
}

impl StubSigner {
    pub fn new(public: Vec<u8>) -> Self {
        Self { public }
    }
}

impl Signer for StubSigner {
    fn public_key(&self) -> &[u8] {
        &self.public
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        stub_signature(&self.public, data)
    }

    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
        signature == stub_signature(public_key, data)
    }
}

/// Transport session stand-in that records attached streams.
#[derive(Default)]
pub struct RecordingSession {
    streams: Mutex<Vec<String>>,
}

impl RecordingSession {
    pub fn streams(&self) -> Vec<String> {
        self.streams.lock().unwrap().clone()
    }
}

pub struct SessionPeer {
    address: Address,
    session: Arc<RecordingSession>,
}

impl NetworkPeer for SessionPeer {
    type Session = Arc<RecordingSession>;
    type Stream = String;

    fn session(&self) -> &Self::Session {
        &self.session
    }

    fn add_stream(&self, stream: String) {
        self.session.streams.lock().unwrap().push(stream);
    }

    fn address(&self) -> &Address {
        &self.address
    }
}

/// Protocol handler that records every call so tests can assert on order,
/// and supports injected per-kind failures and handshake refusals.
pub struct RecordingHandler {
    signer: StubSigner,
    session: Arc<RecordingSession>,
    admitted: Mutex<Vec<Address>>,
    handled: Mutex<Vec<MessageKind>>,
    closed: Mutex<Vec<Address>>,
    fail_on: Mutex<HashSet<MessageKind>>,
    refuse_resolution: Mutex<bool>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self {
            signer: StubSigner::new(vec![0xaa; 32]),
            session: Arc::new(RecordingSession::default()),
            admitted: Mutex::new(Vec::new()),
            handled: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            fail_on: Mutex::new(HashSet::new()),
            refuse_resolution: Mutex::new(false),
        }
    }

    pub fn session(&self) -> Arc<RecordingSession> {
        self.session.clone()
    }

    pub fn admitted(&self) -> Vec<Address> {
        self.admitted.lock().unwrap().clone()
    }

    pub fn handled(&self) -> Vec<MessageKind> {
        self.handled.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<Address> {
        self.closed.lock().unwrap().clone()
    }

    pub fn set_failure(&self, kind: MessageKind, fail: bool) {
        let mut fail_on = self.fail_on.lock().unwrap();
        if fail {
            fail_on.insert(kind);
        } else {
            fail_on.remove(&kind);
        }
    }

    /// Make the next handshake fail as if the peer's address could not be
    /// resolved.
    pub fn set_refuse_resolution(&self, refuse: bool) {
        *self.refuse_resolution.lock().unwrap() = refuse;
    }

    fn record(&self, kind: MessageKind) -> Result<()> {
        self.handled.lock().unwrap().push(kind);
        if self.fail_on.lock().unwrap().contains(&kind) {
            return Err(anyhow!("injected handler failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProtocolHandler for RecordingHandler {
    type Peer = SessionPeer;

    async fn handle_handshake(
        &self,
        header: ConnectionHeader,
    ) -> Result<SessionPeer, HandshakeError> {
        if header.challenge.is_empty() {
            return Err(HandshakeError::MalformedHeader(
                "empty challenge".to_string(),
            ));
        }
        let address = header.verify_identity(&self.signer)?;
        if *self.refuse_resolution.lock().unwrap() {
            return Err(AddressResolutionError::new(header.remote).into());
        }
        self.admitted.lock().unwrap().push(address);
        Ok(SessionPeer {
            address,
            session: self.session.clone(),
        })
    }

    fn handle_close_connection(&self, address: &Address) {
        self.closed.lock().unwrap().push(*address);
    }

    async fn handle_announce(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Announce)
    }

    async fn handle_query(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Query)
    }

    async fn handle_find_closest(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::FindClosest)
    }

    async fn handle_search(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Search)
    }

    async fn handle_recent(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Recent)
    }

    async fn handle_popular(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Popular)
    }

    async fn handle_hash_list(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::HashList)
    }

    async fn handle_piece(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Piece)
    }

    async fn handle_add_peer(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::AddPeer)
    }

    async fn handle_ping(&self, _message: &Message) -> Result<()> {
        self.record(MessageKind::Ping)
    }
}

/// Message source that replays a script, then reports clean end of stream.
pub struct ScriptedSource {
    script: VecDeque<Result<Message, String>>,
}

impl ScriptedSource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            script: messages.into_iter().map(Ok).collect(),
        }
    }

    /// Replays `messages`, then fails with `error` instead of a clean EOF.
    pub fn with_failure(messages: Vec<Message>, error: &str) -> Self {
        let mut script: VecDeque<_> = messages.into_iter().map(Ok).collect();
        script.push_back(Err(error.to_string()));
        Self { script }
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        match self.script.pop_front() {
            None => Ok(None),
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(error)) => Err(anyhow!(error)),
        }
    }
}

/// Message source that never yields, for cancellation tests.
pub struct PendingSource;

#[async_trait]
impl MessageSource for PendingSource {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        std::future::pending().await
    }
}

pub fn make_key(index: u8) -> Vec<u8> {
    let mut key = vec![0u8; 32];
    key[0] = index;
    key
}

/// A header whose signature verifies under the stub scheme.
pub fn make_header(public_key: Vec<u8>, remote: &str) -> ConnectionHeader {
    let challenge = b"challenge-bytes".to_vec();
    let signature = stub_signature(&public_key, &challenge);
    ConnectionHeader {
        public_key,
        challenge,
        signature,
        remote: remote.to_string(),
    }
}

pub fn make_message(kind: MessageKind) -> Message {
    Message::new(kind)
}
