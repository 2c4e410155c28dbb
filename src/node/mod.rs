//! A Diameter node: ties the peer state machine (`peer`), watchdog
//! (`watchdog`), connection manager (`connection`) and router
//! (`router`/`application`) together into the capabilities-exchange +
//! request/answer lifecycle described by RFC 6733 section 5.

pub mod application;
pub mod connection;
pub mod peer;
pub mod router;
pub mod uri;
pub mod watchdog;

use crate::avp::Identity;
use crate::commands::{
    CapabilitiesExchangeAnswer, CapabilitiesExchangeRequest, DeviceWatchdogAnswer, DeviceWatchdogRequest, DisconnectPeerAnswer, DisconnectPeerRequest,
};
use crate::constants::{command_code, disconnect_cause, result_code};
use crate::diameter::flags;
use crate::error::{Error, Result};
use crate::node::connection::{read_message, write_message, ReconnectConfig};
use crate::node::peer::{elect, Keep, Peer, PeerState, Role};
use crate::node::router::Router;
use crate::node::uri::DiameterUri;
use crate::node::watchdog::Watchdog;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Options for a Diameter node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub origin_host: String,
    pub origin_realm: String,
    pub vendor_id: u32,
    pub product_name: String,
    pub watchdog_interval: Duration,
    pub watchdog_answer_timeout: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            origin_host: "localhost".to_string(),
            origin_realm: "localhost".to_string(),
            vendor_id: 0,
            product_name: "diameter-rs".to_string(),
            watchdog_interval: Duration::from_secs(30),
            watchdog_answer_timeout: Duration::from_secs(5),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// A statically-configured peer to dial, with optional persistent
/// reconnection (RFC 6733 section 2.1's "persistent peer" notion: a peer
/// this node redials after every disconnect, rather than dropping once its
/// connection goes away).
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub uri: String,
    pub is_persistent: bool,
    pub reconnect_wait: Duration,
}

impl PeerConfig {
    pub fn new(uri: &str) -> PeerConfig {
        PeerConfig {
            uri: uri.to_string(),
            is_persistent: true,
            reconnect_wait: Duration::from_secs(10),
        }
    }

    fn dial_addr(&self) -> String {
        match DiameterUri::parse(&self.uri) {
            Ok(parsed) => parsed.socket_addr_string(),
            Err(_) => self.uri.clone(),
        }
    }
}

/// A running Diameter node: one per process, typically. Holds the
/// application registry and accepts/dials peer connections.
pub struct Node {
    config: NodeConfig,
    router: Arc<Router>,
    end_to_end: AtomicU32,
}

impl Node {
    pub fn new(config: NodeConfig) -> Node {
        Node {
            config,
            router: Arc::new(Router::new()),
            end_to_end: AtomicU32::new(0),
        }
    }

    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.router)
    }

    fn next_end_to_end_id(&self) -> u32 {
        self.end_to_end.fetch_add(1, Ordering::Relaxed)
    }

    fn our_cer(&self) -> CapabilitiesExchangeRequest {
        let mut req =
            CapabilitiesExchangeRequest::new(&self.config.origin_host, &self.config.origin_realm, self.config.vendor_id, &self.config.product_name);
        req.auth_application_ids = self.router.registered_application_ids();
        req
    }

    /// Binds `addr` and accepts peer connections forever, spawning a reader
    /// task (and watchdog) per accepted peer after a successful CER/CEA
    /// exchange. Never returns on success; the only error path is a failed
    /// bind.
    pub async fn listen(self: &Arc<Self>, addr: &str) -> Result<()> {
        let listener = connection::bind(addr).await?;
        Arc::clone(self).accept_loop(listener).await;
        Ok(())
    }

    /// Binds `addr`, spawns the accept loop in the background and returns
    /// the bound `SocketAddr` immediately -- useful when `addr` asks for an
    /// ephemeral port (`"127.0.0.1:0"`) and the caller needs to know which
    /// one the OS picked.
    pub async fn listen_background(self: &Arc<Self>, addr: &str) -> Result<std::net::SocketAddr> {
        let listener = connection::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let node = Arc::clone(self);
        tokio::spawn(async move {
            node.accept_loop(listener).await;
        });
        Ok(local_addr)
    }

    async fn accept_loop(self: Arc<Self>, listener: tokio::net::TcpListener) {
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("accept failed: {}", e);
                    continue;
                }
            };
            let node = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = node.accept_peer(stream).await {
                    log::warn!("[{}] inbound handshake failed: {}", peer_addr, e);
                }
            });
        }
    }

    async fn accept_peer(self: Arc<Self>, mut stream: TcpStream) -> Result<()> {
        let cer_msg = read_message(&mut stream).await?;
        let cer = CapabilitiesExchangeRequest::try_from(cer_msg)?;

        let mut cea = CapabilitiesExchangeAnswer::new(
            result_code::DIAMETER_SUCCESS,
            &self.config.origin_host,
            &self.config.origin_realm,
            self.config.vendor_id,
            &self.config.product_name,
        );
        cea.auth_application_ids = self.router.registered_application_ids();
        write_message(&mut stream, &cea.into()).await?;

        let local_host = Identity::from_str(&self.config.origin_host);

        // RFC 6733 section 5.6.4: if we already hold an open connection we
        // initiated to this same peer, this is a simultaneous-connection
        // race and election decides which one survives.
        if let Some(existing) = self.router.peer(&cer.origin_host) {
            if existing.state().is_open() && existing.role == Role::Initiator {
                match elect(&local_host, &cer.origin_host) {
                    Keep::Local => {
                        log::info!("won election against {}, rejecting newly accepted connection", cer.origin_host);
                        let _ = stream.shutdown().await;
                        return Ok(());
                    }
                    Keep::Remote => {
                        log::info!("lost election against {}, closing our existing connection", cer.origin_host);
                        existing.close().await;
                        self.router.remove_peer(&cer.origin_host);
                    }
                }
            }
        }

        self.spawn_peer(stream, cer.origin_host, cer.origin_realm, Role::Responder, PeerState::ROpen)
            .await?;
        Ok(())
    }

    /// Dials `addr`, performs CER/CEA as the initiator, and registers the
    /// resulting peer.
    pub async fn connect(self: &Arc<Self>, addr: &str) -> Result<()> {
        self.connect_once(addr).await?;
        Ok(())
    }

    async fn connect_once(self: &Arc<Self>, addr: &str) -> Result<Arc<Peer>> {
        let mut stream = connection::dial_with_backoff(addr, &self.config.reconnect).await;

        let mut req: crate::diameter::DiameterMessage = self.our_cer().into();
        req.header.hop_by_hop_id = 0;
        req.header.end_to_end_id = self.next_end_to_end_id();
        write_message(&mut stream, &req).await?;

        let cea_msg = read_message(&mut stream).await?;
        let cea = CapabilitiesExchangeAnswer::try_from(cea_msg)?;
        if !result_code::is_success(cea.result_code) {
            return Err(Error::ClientError(format!(
                "capabilities exchange rejected, result-code {}",
                cea.result_code
            )));
        }

        let local_host = Identity::from_str(&self.config.origin_host);

        if let Some(existing) = self.router.peer(&cea.origin_host) {
            if existing.state().is_open() && existing.role == Role::Responder {
                match elect(&local_host, &cea.origin_host) {
                    Keep::Remote => {
                        log::info!("lost election to {}, keeping remote-initiated connection", cea.origin_host);
                        let _ = stream.shutdown().await;
                        return Err(Error::ClientError(format!("lost election to {}", cea.origin_host)));
                    }
                    Keep::Local => {
                        log::info!("won election against {}, closing their existing connection", cea.origin_host);
                        existing.close().await;
                        self.router.remove_peer(&cea.origin_host);
                    }
                }
            }
        }

        self.spawn_peer(stream, cea.origin_host, cea.origin_realm, Role::Initiator, PeerState::IOpen)
            .await
    }

    /// Dials `config.uri` once, and if `config.is_persistent` keeps
    /// redialing after every disconnect (RFC 6733 section 2.1).
    pub async fn connect_persistent(self: &Arc<Self>, config: PeerConfig) -> Result<()> {
        let addr = config.dial_addr();
        let peer = self.connect_once(&addr).await?;

        if !config.is_persistent {
            return Ok(());
        }

        let node = Arc::clone(self);
        tokio::spawn(async move {
            let mut current = peer;
            loop {
                wait_until_closed(&current).await;
                tokio::time::sleep(config.reconnect_wait).await;
                log::info!("redialing persistent peer at {}", addr);
                match node.connect_once(&addr).await {
                    Ok(new_peer) => current = new_peer,
                    Err(e) => {
                        log::warn!("failed to redial {}: {}", addr, e);
                    }
                }
            }
        });

        Ok(())
    }

    /// Gracefully disconnects every peer (RFC 6733 section 5.4): sends a
    /// Disconnect-Peer-Request, waits up to `answer_timeout` for the
    /// Disconnect-Peer-Answer, then tears down the transport either way.
    pub async fn shutdown(self: &Arc<Self>, answer_timeout: Duration) {
        for peer in self.router.all_peers().into_iter() {
            self.disconnect_peer(&peer, answer_timeout).await;
        }
    }

    async fn disconnect_peer(&self, peer: &Arc<Peer>, answer_timeout: Duration) {
        let dpr = DisconnectPeerRequest::new(&self.config.origin_host, &self.config.origin_realm, disconnect_cause::REBOOTING);
        let mut msg: crate::diameter::DiameterMessage = dpr.into();
        msg.header.hop_by_hop_id = peer.next_hop_by_hop_id();

        match peer.send_request(&msg).await {
            Ok(rx) => match tokio::time::timeout(answer_timeout, rx).await {
                Ok(Ok(answer)) => match DisconnectPeerAnswer::try_from(answer) {
                    Ok(dpa) => log::info!("peer {} acked disconnect, result-code {}", peer.origin_host, dpa.result_code),
                    Err(e) => log::warn!("malformed DPA from {}: {}", peer.origin_host, e),
                },
                _ => {
                    log::warn!("peer {} did not answer DPR within {:?}", peer.origin_host, answer_timeout);
                    peer.cancel_outstanding(msg.header.hop_by_hop_id).await;
                }
            },
            Err(e) => log::warn!("failed sending DPR to {}: {}", peer.origin_host, e),
        }

        peer.close().await;
        self.router.remove_peer(&peer.origin_host);
    }

    async fn spawn_peer(
        self: &Arc<Self>,
        stream: TcpStream,
        origin_host: Identity,
        origin_realm: Identity,
        role: Role,
        open_state: PeerState,
    ) -> Result<Arc<Peer>> {
        let (mut reader, writer) = tokio::io::split(stream);
        let writer: Arc<Mutex<dyn tokio::io::AsyncWrite + Send + Unpin>> = Arc::new(Mutex::new(writer));

        let peer = Arc::new(Peer::new(origin_host.clone(), origin_realm.clone(), role, writer));
        peer.set_state(open_state);
        self.router.add_peer(Arc::clone(&peer), origin_realm.clone());

        let watchdog_peer = Arc::clone(&peer);
        let watchdog_router = self.router();
        let watchdog_origin_host = Identity::from_str(&self.config.origin_host);
        let watchdog_origin_realm = Identity::from_str(&self.config.origin_realm);
        let tw = self.config.watchdog_interval;
        let answer_timeout = self.config.watchdog_answer_timeout;
        let state_rx = peer.watch_state();
        let hop_peer = Arc::clone(&peer);
        tokio::spawn(async move {
            let watchdog = Watchdog::new(watchdog_peer, watchdog_router, watchdog_origin_host, watchdog_origin_realm, tw, answer_timeout);
            watchdog.run(|| hop_peer.next_hop_by_hop_id(), state_rx).await;
        });

        let router = self.router();
        let reader_peer = Arc::clone(&peer);
        let local_config_host = Identity::from_str(&self.config.origin_host);
        let local_config_realm = Identity::from_str(&self.config.origin_realm);
        let reader_handle = tokio::spawn(async move {
            loop {
                let msg = match read_message(&mut reader).await {
                    Ok(msg) => msg,
                    Err(Error::MalformedBody { header, source }) => {
                        if header.flags & flags::REQUEST == 0 {
                            log::warn!("malformed answer from {}: {}", reader_peer.origin_host, source);
                            continue;
                        }
                        let result_code = match *source {
                            Error::UnknownMandatoryAvp(_) => result_code::DIAMETER_AVP_UNSUPPORTED,
                            _ => result_code::DIAMETER_INVALID_AVP_VALUE,
                        };
                        log::warn!(
                            "malformed body from {} for code {}: {}, replying {}",
                            reader_peer.origin_host,
                            header.code,
                            source,
                            result_code
                        );
                        let answer = error_answer(&header, &local_config_host, &local_config_realm, result_code);
                        if let Err(e) = reader_peer.write(&answer).await {
                            log::warn!("failed writing error answer to {}: {}", reader_peer.origin_host, e);
                            break;
                        }
                        continue;
                    }
                    Err(e) => {
                        log::info!("peer {} disconnected: {}", reader_peer.origin_host, e);
                        break;
                    }
                };

                if msg.header.flags & flags::REQUEST != 0 && msg.header.code == command_code::DEVICE_WATCHDOG {
                    // RFC 3539 section 3.4: answered by the base protocol layer
                    // itself, never handed to an application.
                    let dwr_header = msg.header.clone();
                    let mut answer: crate::diameter::DiameterMessage = match DeviceWatchdogRequest::try_from(msg) {
                        Ok(dwr) => {
                            log::debug!("received DWR from {}", dwr.origin_host);
                            DeviceWatchdogAnswer::new(result_code::DIAMETER_SUCCESS, &local_config_host.as_str(), &local_config_realm.as_str()).into()
                        }
                        Err(e) => {
                            log::warn!("malformed DWR from {}: {}", reader_peer.origin_host, e);
                            continue;
                        }
                    };
                    answer.header.hop_by_hop_id = dwr_header.hop_by_hop_id;
                    answer.header.end_to_end_id = dwr_header.end_to_end_id;
                    if let Err(e) = reader_peer.write(&answer).await {
                        log::warn!("failed writing DWA to {}: {}", reader_peer.origin_host, e);
                        break;
                    }
                } else if msg.header.flags & flags::REQUEST != 0 && msg.header.code == command_code::DISCONNECT_PEER {
                    // RFC 6733 section 5.4.2: answer, then close our side too.
                    let dpr_header = msg.header.clone();
                    if let Ok(dpr) = DisconnectPeerRequest::try_from(msg) {
                        log::info!("received DPR from {}, cause {}", reader_peer.origin_host, dpr.disconnect_cause);
                    }
                    let mut answer: crate::diameter::DiameterMessage =
                        DisconnectPeerAnswer::new(result_code::DIAMETER_SUCCESS, &local_config_host.as_str(), &local_config_realm.as_str()).into();
                    answer.header.hop_by_hop_id = dpr_header.hop_by_hop_id;
                    answer.header.end_to_end_id = dpr_header.end_to_end_id;
                    if let Err(e) = reader_peer.write(&answer).await {
                        log::warn!("failed writing DPA to {}: {}", reader_peer.origin_host, e);
                    }
                    break;
                } else if msg.header.flags & flags::REQUEST != 0 {
                    let header = msg.header.clone();
                    let answer = match router.dispatch(msg).await {
                        Ok(answer) => answer,
                        Err(Error::ApplicationUnsupported) => {
                            log::warn!(
                                "no application registered for {} from {}, replying 3007",
                                header.application_id,
                                reader_peer.origin_host
                            );
                            error_answer(&header, &local_config_host, &local_config_realm, result_code::DIAMETER_APPLICATION_UNSUPPORTED)
                        }
                        Err(e) => {
                            log::warn!("application error for {}: {}", reader_peer.origin_host, e);
                            continue;
                        }
                    };
                    if let Err(e) = reader_peer.write(&answer).await {
                        log::warn!("failed writing answer to {}: {}", reader_peer.origin_host, e);
                        break;
                    }
                } else if let Err(e) = reader_peer.deliver_answer(msg).await {
                    log::warn!("undeliverable answer from {}: {}", reader_peer.origin_host, e);
                }
            }

            reader_peer.set_state(PeerState::Closed);
            router.fail_peer(&reader_peer, &local_config_host, &local_config_realm).await;
        });
        peer.set_reader_task(reader_handle).await;

        Ok(peer)
    }
}

/// Waits for a peer's state to become `Closed`, whether it already is or
/// transitions there later. Used by the persistent-peer reconnect loop.
async fn wait_until_closed(peer: &Arc<Peer>) {
    let mut state_rx = peer.watch_state();
    loop {
        if *state_rx.borrow() == PeerState::Closed {
            return;
        }
        if state_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Builds an error answer for a request: the R-bit is cleared, the E-bit is
/// set, and Origin-Host/Origin-Realm/Result-Code are attached (RFC 6733
/// section 7.1.7). Used both for unsupported applications and for
/// body-level codec failures (unknown mandatory AVP, truncated AVP, ...)
/// and for failover's locally-synthesized DIAMETER_UNABLE_TO_DELIVER.
pub(crate) fn error_answer(
    req_header: &crate::diameter::DiameterHeader,
    origin_host: &Identity,
    origin_realm: &Identity,
    result_code: u32,
) -> crate::diameter::DiameterMessage {
    use crate::avp::Unsigned32;
    use crate::constants::avp_code;

    let mut answer = crate::diameter::DiameterMessage::new(
        req_header.code,
        req_header.application_id,
        (req_header.flags & !flags::REQUEST) | flags::ERROR,
        req_header.hop_by_hop_id,
        req_header.end_to_end_id,
    );
    answer.add_avp(crate::avp!(avp_code::ORIGIN_HOST, None, origin_host.clone()));
    answer.add_avp(crate::avp!(avp_code::ORIGIN_REALM, None, origin_realm.clone()));
    answer.add_avp(crate::avp!(avp_code::RESULT_CODE, None, Unsigned32::new(result_code)));
    answer
}
