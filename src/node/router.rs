//! Application registry and realm-based routing.

use crate::avp::Identity;
use crate::diameter::{flags, ApplicationId, DiameterMessage};
use crate::error::{Error, Result};
use crate::node::application::Application;
use crate::node::peer::{OutstandingRequest, Peer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Routes inbound requests to the registered `Application` for their
/// Application-Id, and outbound requests to a peer serving a realm.
pub struct Router {
    applications: RwLock<HashMap<ApplicationId, Arc<dyn Application>>>,
    peers: RwLock<HashMap<Identity, Arc<Peer>>>,
    realm_peers: RwLock<HashMap<Identity, Vec<Identity>>>,
    round_robin: AtomicUsize,
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

impl Router {
    pub fn new() -> Router {
        Router {
            applications: RwLock::new(HashMap::new()),
            peers: RwLock::new(HashMap::new()),
            realm_peers: RwLock::new(HashMap::new()),
            round_robin: AtomicUsize::new(0),
        }
    }

    pub fn register_application(&self, app: Arc<dyn Application>) {
        self.applications.write().unwrap().insert(app.application_id(), app);
    }

    pub fn application_for(&self, application_id: ApplicationId) -> Option<Arc<dyn Application>> {
        self.applications.read().unwrap().get(&application_id).cloned()
    }

    /// Application-Ids to advertise in this node's own CER/CEA.
    pub fn registered_application_ids(&self) -> Vec<ApplicationId> {
        self.applications.read().unwrap().keys().copied().collect()
    }

    pub fn add_peer(&self, peer: Arc<Peer>, realm: Identity) {
        let host = peer.origin_host.clone();
        self.peers.write().unwrap().insert(host.clone(), peer);
        self.realm_peers.write().unwrap().entry(realm).or_default().push(host);
    }

    pub fn remove_peer(&self, host: &Identity) {
        self.peers.write().unwrap().remove(host);
        let mut realm_peers = self.realm_peers.write().unwrap();
        for hosts in realm_peers.values_mut() {
            hosts.retain(|h| h != host);
        }
    }

    pub fn peer(&self, host: &Identity) -> Option<Arc<Peer>> {
        self.peers.read().unwrap().get(host).cloned()
    }

    /// All currently-registered peers, for broadcast operations like
    /// graceful shutdown.
    pub fn all_peers(&self) -> Vec<Arc<Peer>> {
        self.peers.read().unwrap().values().cloned().collect()
    }

    /// Picks a peer serving `realm`, round-robin across the peers
    /// registered for it. Returns `ApplicationUnsupported` if none are
    /// known for that realm (no common application / no route).
    pub fn route_to_realm(&self, realm: &Identity) -> Result<Arc<Peer>> {
        let realm_peers = self.realm_peers.read().unwrap();
        let hosts = realm_peers.get(realm).ok_or(Error::ApplicationUnsupported)?;
        if hosts.is_empty() {
            return Err(Error::ApplicationUnsupported);
        }
        let idx = self.round_robin.fetch_add(1, Ordering::Relaxed) % hosts.len();
        let host = &hosts[idx];
        drop(realm_peers);
        self.peer(host).ok_or(Error::PeerGone)
    }

    /// Dispatches a decoded request to its Application-Id's handler.
    pub async fn dispatch(&self, req: DiameterMessage) -> Result<DiameterMessage> {
        let app = self
            .application_for(req.header.application_id)
            .ok_or(Error::ApplicationUnsupported)?;
        app.handle_request(req).await
    }

    /// Tears down a dead peer: deregisters it, then either retransmits
    /// each of its outstanding requests to another peer serving the same
    /// realm (RFC 6733 section 5.5 failover) or, if none remains, resolves
    /// it locally with a DIAMETER_UNABLE_TO_DELIVER answer.
    pub async fn fail_peer(&self, peer: &Arc<Peer>, local_origin_host: &Identity, local_origin_realm: &Identity) {
        self.remove_peer(&peer.origin_host);
        for (_, entry) in peer.take_outstanding().await {
            self.retry_or_answer(&peer.origin_realm, local_origin_host, local_origin_realm, entry)
                .await;
        }
    }

    async fn retry_or_answer(
        &self,
        realm: &Identity,
        local_origin_host: &Identity,
        local_origin_realm: &Identity,
        entry: OutstandingRequest,
    ) {
        if let Ok(alt_peer) = self.route_to_realm(realm) {
            let mut retransmit = entry.request.clone();
            retransmit.header.hop_by_hop_id = alt_peer.next_hop_by_hop_id();
            retransmit.header.flags |= flags::RETRANSMIT;
            if let Ok(rx) = alt_peer.send_request(&retransmit).await {
                tokio::spawn(async move {
                    if let Ok(answer) = rx.await {
                        let _ = entry.sender.send(answer);
                    }
                });
                return;
            }
        }
        log::warn!(
            "no alternate peer for realm {}, answering request {} locally with DIAMETER_UNABLE_TO_DELIVER",
            realm,
            entry.request.header.hop_by_hop_id
        );
        let answer = crate::node::error_answer(
            &entry.request.header,
            local_origin_host,
            local_origin_realm,
            crate::constants::result_code::DIAMETER_UNABLE_TO_DELIVER,
        );
        let _ = entry.sender.send(answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::application::ThreadPerRequestApplication;

    #[tokio::test]
    async fn test_dispatch_unsupported_application() {
        let router = Router::new();
        let req = DiameterMessage::new(272, 4, 0, 1, 1);
        match router.dispatch(req).await {
            Err(Error::ApplicationUnsupported) => {}
            other => panic!("expected ApplicationUnsupported, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_registered_application() {
        let router = Router::new();
        let app = ThreadPerRequestApplication::new(4, |req: DiameterMessage| async move { Ok(req.to_answer()) });
        router.register_application(Arc::new(app));

        let req = DiameterMessage::new(272, 4, crate::diameter::flags::REQUEST, 1, 1);
        let answer = router.dispatch(req).await.unwrap();
        assert_eq!(answer.header.application_id, 4);
        assert_eq!(answer.header.flags & crate::diameter::flags::REQUEST, 0);
    }

    #[test]
    fn test_route_to_realm_round_robin() {
        let router = Router::new();
        let realm = Identity::from_str("example.com");
        // route_to_realm with no peers registered should fail.
        assert!(router.route_to_realm(&realm).is_err());
    }

    fn dummy_peer(host: &str) -> Arc<Peer> {
        use crate::node::peer::Role;
        use tokio::io::sink;
        let writer: Arc<tokio::sync::Mutex<dyn tokio::io::AsyncWrite + Send + Unpin>> = Arc::new(tokio::sync::Mutex::new(sink()));
        Arc::new(Peer::new(Identity::from_str(host), Identity::from_str("example.com"), Role::Initiator, writer))
    }

    #[test]
    fn test_route_to_realm_round_robins_over_registered_peers() {
        let router = Router::new();
        let realm = Identity::from_str("example.com");
        let a = dummy_peer("a.example.com");
        let b = dummy_peer("b.example.com");
        router.add_peer(Arc::clone(&a), realm.clone());
        router.add_peer(Arc::clone(&b), realm.clone());

        let first = router.route_to_realm(&realm).unwrap().origin_host.clone();
        let second = router.route_to_realm(&realm).unwrap().origin_host.clone();
        let third = router.route_to_realm(&realm).unwrap().origin_host.clone();
        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[tokio::test]
    async fn test_fail_peer_answers_unable_to_deliver_when_no_alternate() {
        let router = Router::new();
        let realm = Identity::from_str("example.com");
        let dead = dummy_peer("dead.example.com");
        router.add_peer(Arc::clone(&dead), realm.clone());

        let req = DiameterMessage::new(272, 4, crate::diameter::flags::REQUEST, 9, 9);
        let rx = dead.send_request(&req).await.unwrap();

        router
            .fail_peer(&dead, &Identity::from_str("local.example.com"), &Identity::from_str("example.com"))
            .await;

        let answer = rx.await.unwrap();
        let result_code = answer
            .get_avp(crate::constants::avp_code::RESULT_CODE, None)
            .and_then(|a| a.as_unsigned32())
            .unwrap();
        assert_eq!(result_code, crate::constants::result_code::DIAMETER_UNABLE_TO_DELIVER);
        assert!(router.peer(&Identity::from_str("dead.example.com")).is_none());
    }
}
