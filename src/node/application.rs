//! Application runtime: dispatches inbound requests for one Application-Id
//! to user handler code, and gives handlers a way to issue outbound
//! requests against a bound peer.
//!
//! Grounded on the original source's `SimpleThreadingApplication` (one
//! worker thread per request by default), translated to tokio tasks.

use crate::diameter::{ApplicationId, DiameterMessage};
use crate::error::{Error, Result};
use crate::node::peer::{Peer, PeerState};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub type HandlerResult = Pin<Box<dyn Future<Output = Result<DiameterMessage>> + Send>>;

/// A registered handler for one Application-Id.
pub trait Application: Send + Sync {
    fn application_id(&self) -> ApplicationId;

    /// Handles one inbound request and resolves to the answer to send back.
    fn handle_request(&self, req: DiameterMessage) -> HandlerResult;
}

/// Spawns a fresh `tokio::spawn` task per inbound request -- the default,
/// maximizing concurrency at the cost of no per-application ordering
/// guarantee.
pub struct ThreadPerRequestApplication<F> {
    application_id: ApplicationId,
    handler: Arc<F>,
}

impl<F, Fut> ThreadPerRequestApplication<F>
where
    F: Fn(DiameterMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DiameterMessage>> + Send + 'static,
{
    pub fn new(application_id: ApplicationId, handler: F) -> Self {
        ThreadPerRequestApplication {
            application_id,
            handler: Arc::new(handler),
        }
    }
}

impl<F, Fut> Application for ThreadPerRequestApplication<F>
where
    F: Fn(DiameterMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DiameterMessage>> + Send + 'static,
{
    fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    fn handle_request(&self, req: DiameterMessage) -> HandlerResult {
        let handler = Arc::clone(&self.handler);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = handler(req).await;
            let _ = tx.send(result);
        });
        Box::pin(async move { rx.await.map_err(|_| Error::ServerError("application task dropped".into()))? })
    }
}

type QueueItem = (DiameterMessage, oneshot::Sender<Result<DiameterMessage>>);

/// Drains requests through one dedicated task, so handler invocations for
/// this application are strictly serialized.
pub struct SingleTaskApplication {
    application_id: ApplicationId,
    tx: mpsc::Sender<QueueItem>,
}

impl SingleTaskApplication {
    pub fn new<F, Fut>(application_id: ApplicationId, handler: F) -> Self
    where
        F: Fn(DiameterMessage) -> Fut + Send + 'static,
        Fut: Future<Output = Result<DiameterMessage>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<QueueItem>(64);
        tokio::spawn(async move {
            while let Some((req, reply_tx)) = rx.recv().await {
                let result = handler(req).await;
                let _ = reply_tx.send(result);
            }
        });
        SingleTaskApplication { application_id, tx }
    }
}

impl Application for SingleTaskApplication {
    fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    fn handle_request(&self, req: DiameterMessage) -> HandlerResult {
        let tx = self.tx.clone();
        Box::pin(async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            tx.send((req, reply_tx))
                .await
                .map_err(|_| Error::ServerError("application task gone".into()))?;
            reply_rx.await.map_err(|_| Error::ServerError("application task dropped".into()))?
        })
    }
}

/// A handle bound to one peer, for application code that initiates
/// requests rather than just answering them.
pub struct PeerHandle {
    peer: Arc<Peer>,
}

impl PeerHandle {
    pub fn new(peer: Arc<Peer>) -> PeerHandle {
        PeerHandle { peer }
    }

    /// Resolves once the bound peer reaches an open state.
    pub async fn wait_for_ready(&self) {
        let mut state_rx = self.peer.watch_state();
        while !self.peer.state().is_open() {
            if state_rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sends `req` over the bound peer and waits up to `timeout` for the
    /// matching answer.
    pub async fn send_request(&self, mut req: DiameterMessage, timeout: Duration) -> Result<DiameterMessage> {
        if !self.peer.state().is_open() {
            return Err(Error::PeerGone);
        }
        let hop_by_hop = self.peer.next_hop_by_hop_id();
        req.header.hop_by_hop_id = hop_by_hop;
        let rx = self.peer.send_request(&req).await?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) => {
                self.peer.cancel_outstanding(hop_by_hop).await;
                Err(Error::PeerGone)
            }
            Err(_) => {
                self.peer.cancel_outstanding(hop_by_hop).await;
                Err(Error::Timeout)
            }
        }
    }

    pub fn state(&self) -> PeerState {
        self.peer.state()
    }
}
