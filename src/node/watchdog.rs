//! Device watchdog (RFC 3539 section 3.4).

use crate::commands::{DeviceWatchdogAnswer, DeviceWatchdogRequest};
use crate::node::peer::{Peer, PeerState};
use crate::node::router::Router;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A peer is considered dead after this many consecutive missed DWAs
/// (RFC 3539 section 3.4.1's "if the number of failed attempts is >= 2").
const MAX_MISSED: u32 = 2;

/// Runs the watchdog loop for one peer: fires a DWR every `tw` (jittered by
/// up to 10%, per RFC 3539 section 3.4.1's recommendation to randomize the
/// timer so peers don't all fire in lockstep), waits `answer_timeout` for a
/// matching DWA, and escalates the peer to `Closing` after `MAX_MISSED`
/// consecutive misses.
pub struct Watchdog {
    peer: Arc<Peer>,
    router: Arc<Router>,
    origin_host: crate::avp::Identity,
    origin_realm: crate::avp::Identity,
    tw: Duration,
    answer_timeout: Duration,
    missed: AtomicU32,
}

impl Watchdog {
    pub fn new(
        peer: Arc<Peer>,
        router: Arc<Router>,
        origin_host: crate::avp::Identity,
        origin_realm: crate::avp::Identity,
        tw: Duration,
        answer_timeout: Duration,
    ) -> Watchdog {
        Watchdog {
            peer,
            router,
            origin_host,
            origin_realm,
            tw,
            answer_timeout,
            missed: AtomicU32::new(0),
        }
    }

    fn jittered_interval(&self) -> Duration {
        let base = self.tw.as_millis() as f64;
        let jitter = rand::random::<f64>() * 0.2 - 0.1; // +/-10%
        let millis = (base * (1.0 + jitter)).max(0.0) as u64;
        Duration::from_millis(millis)
    }

    /// Runs until the peer's state watch channel is dropped or the peer
    /// transitions out of an open state.
    pub async fn run(&self, mut hop_by_hop_gen: impl FnMut() -> u32, mut state_rx: watch::Receiver<PeerState>) {
        loop {
            tokio::time::sleep(self.jittered_interval()).await;

            if !self.peer.state().is_open() {
                continue;
            }

            let hop_by_hop = hop_by_hop_gen();
            let req = DeviceWatchdogRequest::new(&self.origin_host.as_str(), &self.origin_realm.as_str());
            let mut msg: crate::diameter::DiameterMessage = req.into();
            msg.header.hop_by_hop_id = hop_by_hop;

            let rx = match self.peer.send_request(&msg).await {
                Ok(rx) => rx,
                Err(_) => {
                    self.record_miss();
                    continue;
                }
            };

            match tokio::time::timeout(self.answer_timeout, rx).await {
                Ok(Ok(answer)) => match DeviceWatchdogAnswer::try_from(answer) {
                    Ok(_dwa) => {
                        self.missed.store(0, Ordering::Relaxed);
                    }
                    Err(_) => {
                        self.record_miss();
                    }
                },
                _ => {
                    self.peer.cancel_outstanding(hop_by_hop).await;
                    self.record_miss();
                }
            }

            if self.missed.load(Ordering::Relaxed) >= MAX_MISSED {
                self.peer.set_state(PeerState::Closing);
                log::warn!("peer {} missed {} consecutive DWAs, closing", self.origin_host, MAX_MISSED);
                self.router.fail_peer(&self.peer, &self.origin_host, &self.origin_realm).await;
                self.peer.close().await;
                return;
            }

            if state_rx.has_changed().unwrap_or(false) {
                let state = *state_rx.borrow_and_update();
                if state == PeerState::Closing || state == PeerState::Closed {
                    return;
                }
            }
        }
    }

    fn record_miss(&self) {
        self.missed.fetch_add(1, Ordering::Relaxed);
    }
}
