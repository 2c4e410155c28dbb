//! Peer connection state machine (RFC 6733 section 5.6).

use crate::avp::Identity;
use crate::diameter::DiameterMessage;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::ops::DerefMut;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot::Sender;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;

/// Which side initiated the transport connection. RFC 6733 keeps I/R as
/// separate state variables; this crate merges them into one `PeerState`
/// plus a `Role`, per the permitted state-machine simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Closed,
    WaitConnAck,
    WaitICEA,
    ROpen,
    IOpen,
    Closing,
}

impl PeerState {
    pub fn is_open(&self) -> bool {
        matches!(self, PeerState::ROpen | PeerState::IOpen)
    }
}

/// Outcome of the election procedure (RFC 6733 section 5.6.4): which of the
/// two simultaneous connections between the same pair of peers survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Local,
    Remote,
}

/// Resolves a simultaneous-connection race. The peer whose Origin-Host
/// sorts greater wins and keeps the connection it initiated; called
/// identically from the dialer and the listener accept path so both sides
/// agree without further negotiation.
pub fn elect(local_host: &Identity, remote_host: &Identity) -> Keep {
    if local_host.value() > remote_host.value() {
        Keep::Local
    } else {
        Keep::Remote
    }
}

/// One request awaiting an answer. The request itself is kept alongside
/// the sender so a dead peer's outstanding work can be retransmitted to
/// an alternate peer for the same realm (RFC 6733 section 5.5 failover)
/// instead of just being dropped.
pub struct OutstandingRequest {
    pub sender: Sender<DiameterMessage>,
    pub request: DiameterMessage,
}

/// A live or pending connection to a remote Diameter node.
pub struct Peer {
    pub origin_host: Identity,
    pub origin_realm: Identity,
    pub role: Role,
    writer: Arc<Mutex<dyn AsyncWrite + Send + Unpin>>,
    outstanding: Mutex<HashMap<u32, OutstandingRequest>>,
    hop_by_hop: AtomicU32,
    state_tx: watch::Sender<PeerState>,
    state_rx: watch::Receiver<PeerState>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl Peer {
    pub fn new(
        origin_host: Identity,
        origin_realm: Identity,
        role: Role,
        writer: Arc<Mutex<dyn AsyncWrite + Send + Unpin>>,
    ) -> Peer {
        let (state_tx, state_rx) = watch::channel(PeerState::Closed);
        Peer {
            origin_host,
            origin_realm,
            role,
            writer,
            outstanding: Mutex::new(HashMap::new()),
            hop_by_hop: AtomicU32::new(0),
            state_tx,
            state_rx,
            reader_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PeerState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<PeerState> {
        self.state_rx.clone()
    }

    pub fn set_state(&self, state: PeerState) {
        let _ = self.state_tx.send(state);
    }

    pub fn next_hop_by_hop_id(&self) -> u32 {
        self.hop_by_hop.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends a request and registers an outstanding-request slot keyed by
    /// its hop-by-hop id. The returned receiver resolves when `deliver_answer`
    /// is called with a matching answer, or is dropped if the peer goes away.
    pub async fn send_request(&self, req: &DiameterMessage) -> Result<oneshot::Receiver<DiameterMessage>> {
        let hop_by_hop = req.header.hop_by_hop_id;
        let (tx, rx) = oneshot::channel();
        {
            let mut outstanding = self.outstanding.lock().await;
            if outstanding.contains_key(&hop_by_hop) {
                return Err(Error::DuplicateHopByHopId(hop_by_hop));
            }
            outstanding.insert(
                hop_by_hop,
                OutstandingRequest {
                    sender: tx,
                    request: req.clone(),
                },
            );
        }
        self.write(req).await?;
        Ok(rx)
    }

    /// Writes a message (request or answer) directly, without registering
    /// an outstanding-request slot. Used for answers and one-way sends like
    /// DWR.
    pub async fn write(&self, msg: &DiameterMessage) -> Result<()> {
        let mut bytes = Vec::new();
        msg.encode_to(&mut bytes)?;
        let mut writer = self.writer.lock().await;
        writer.deref_mut().write_all(&bytes).await?;
        Ok(())
    }

    /// Routes an inbound answer to its outstanding request, if any.
    pub async fn deliver_answer(&self, answer: DiameterMessage) -> Result<()> {
        let hop_by_hop = answer.header.hop_by_hop_id;
        let outstanding = {
            let mut outstanding = self.outstanding.lock().await;
            outstanding.remove(&hop_by_hop)
        };
        match outstanding {
            Some(entry) => entry
                .sender
                .send(answer)
                .map_err(|_| Error::ClientError("response receiver dropped".into())),
            None => Err(Error::NoOutstandingRequest(hop_by_hop)),
        }
    }

    /// Drops all outstanding requests; their receivers observe a closed
    /// channel and should surface `Error::PeerGone`.
    pub async fn clear_outstanding(&self) {
        self.outstanding.lock().await.clear();
    }

    /// Removes one outstanding-request slot without resolving it, for a
    /// caller that gave up waiting (e.g. on timeout). A late answer
    /// arriving after this runs `deliver_answer` and gets
    /// `Error::NoOutstandingRequest` instead of resolving anything.
    pub async fn cancel_outstanding(&self, hop_by_hop: u32) {
        self.outstanding.lock().await.remove(&hop_by_hop);
    }

    /// Drains every outstanding request, handing ownership to the caller
    /// instead of just dropping the senders. Used when the peer has died,
    /// so each request can be retransmitted elsewhere (see
    /// `Router::fail_peer`).
    pub async fn take_outstanding(&self) -> Vec<(u32, OutstandingRequest)> {
        self.outstanding.lock().await.drain().collect()
    }

    /// Number of requests awaiting an answer. Exposed for tests and
    /// diagnostics.
    pub async fn outstanding_len(&self) -> usize {
        self.outstanding.lock().await.len()
    }

    /// Registers the task reading this peer's transport, so `close` can
    /// tear it down without waiting for a read error.
    pub async fn set_reader_task(&self, handle: JoinHandle<()>) {
        *self.reader_task.lock().await = Some(handle);
    }

    /// Tears down this connection: marks the peer `Closed`, aborts its
    /// reader task and shuts down the write half. Idempotent. Does not
    /// touch the outstanding-request table or the router's registry --
    /// callers that want failover or deregistration do that separately
    /// (see `Router::fail_peer`), since a deliberate close (election loss,
    /// graceful shutdown) may want different handling than a watchdog
    /// failure.
    pub async fn close(&self) {
        self.set_state(PeerState::Closed);
        if let Some(handle) = self.reader_task.lock().await.take() {
            handle.abort();
        }
        let mut writer = self.writer.lock().await;
        let _ = writer.deref_mut().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elect_is_symmetric() {
        let a = Identity::from_str("a.example.com");
        let b = Identity::from_str("b.example.com");
        assert_eq!(elect(&a, &b), Keep::Remote);
        assert_eq!(elect(&b, &a), Keep::Local);
    }

    #[tokio::test]
    async fn test_cancel_outstanding_removes_single_entry() {
        use crate::diameter::DiameterMessage;
        use tokio::io::sink;

        let writer: Arc<Mutex<dyn AsyncWrite + Send + Unpin>> = Arc::new(Mutex::new(sink()));
        let peer = Peer::new(
            Identity::from_str("peer.example.com"),
            Identity::from_str("example.com"),
            Role::Initiator,
            writer,
        );

        let req_a = DiameterMessage::new(272, 4, crate::diameter::flags::REQUEST, 1, 1);
        let req_b = DiameterMessage::new(272, 4, crate::diameter::flags::REQUEST, 2, 2);
        let _rx_a = peer.send_request(&req_a).await.unwrap();
        let _rx_b = peer.send_request(&req_b).await.unwrap();
        assert_eq!(peer.outstanding_len().await, 2);

        peer.cancel_outstanding(1).await;
        assert_eq!(peer.outstanding_len().await, 1);

        // A late answer for the cancelled hop-by-hop id is now unroutable.
        let late = DiameterMessage::new(272, 4, 0, 1, 1);
        assert!(matches!(peer.deliver_answer(late).await, Err(Error::NoOutstandingRequest(1))));
    }

    #[test]
    fn test_elect_called_from_both_sides_agrees() {
        let a = Identity::from_str("alice.example.com");
        let b = Identity::from_str("bob.example.com");

        // From alice's perspective, local=alice remote=bob.
        let from_alice = elect(&a, &b);
        // From bob's perspective, local=bob remote=alice.
        let from_bob = elect(&b, &a);

        // Both sides should agree bob wins (b > a lexicographically).
        assert_eq!(from_alice, Keep::Remote);
        assert_eq!(from_bob, Keep::Local);
    }

    #[tokio::test]
    async fn test_take_outstanding_drains_and_returns_requests() {
        use crate::diameter::DiameterMessage;
        use tokio::io::sink;

        let writer: Arc<Mutex<dyn AsyncWrite + Send + Unpin>> = Arc::new(Mutex::new(sink()));
        let peer = Peer::new(
            Identity::from_str("peer.example.com"),
            Identity::from_str("example.com"),
            Role::Initiator,
            writer,
        );

        let req = DiameterMessage::new(272, 4, crate::diameter::flags::REQUEST, 7, 7);
        let _rx = peer.send_request(&req).await.unwrap();

        let drained = peer.take_outstanding().await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, 7);
        assert_eq!(drained[0].1.request.header.hop_by_hop_id, 7);
        assert_eq!(peer.outstanding_len().await, 0);
    }

    #[tokio::test]
    async fn test_close_aborts_reader_task_and_sets_closed() {
        use tokio::io::sink;

        let writer: Arc<Mutex<dyn AsyncWrite + Send + Unpin>> = Arc::new(Mutex::new(sink()));
        let peer = Arc::new(Peer::new(
            Identity::from_str("peer.example.com"),
            Identity::from_str("example.com"),
            Role::Responder,
            writer,
        ));
        peer.set_state(PeerState::ROpen);

        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        peer.set_reader_task(handle).await;

        peer.close().await;
        assert_eq!(peer.state(), PeerState::Closed);
    }
}
