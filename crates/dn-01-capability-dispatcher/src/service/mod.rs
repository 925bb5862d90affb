//! Dispatcher Service
//!
//! Bidirectional routing between one peer transport and many local receivers.
//!
//! ## Inbound Pipeline
//!
//! ```text
//! transport ──→ rate limit ──→ validate ──→ lookup ──→ try_send ──→ receiver task
//!                  │               │           │           │
//!                drop        VALIDATION     CAPABILITY    drop
//!                            _FAILED        _NOT_FOUND   (full)
//! ```
//!
//! ## Tasks
//!
//! - One receive loop for the dispatcher's lifetime
//! - One delivery task per registered receiver
//!
//! All tasks hang off a single `CancellationToken` and are tracked by a
//! `TaskTracker`; `close()` returns only after every task has exited.

mod receivers;


use crate::domain::{
    sanitize_log_string, validate_message, DispatcherConfig, DispatcherError, RateLimiter,
};
use crate::ports::{
    CapabilityDispatcher, DispatcherMetrics, DropReason, InboundMessage, MessageReceiver,
    MessageSigner, PeerTransport,
};
use receivers::{ReceiverEntry, ReceiverKey, ReceiverRegistry};
use shared_types::{DonId, ErrorCode, Message, MessageBody, PeerId};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Dependencies for Dispatcher
pub struct DispatcherDependencies<T, S> {
    pub transport: Arc<T>,
    pub signer: Arc<S>,
    pub metrics: Arc<dyn DispatcherMetrics>,
    pub config: DispatcherConfig,
}

/// Capability dispatcher.
///
/// Cheap to clone; clones share the same receivers and tasks.
pub struct Dispatcher<T, S>
where
    T: PeerTransport,
    S: MessageSigner,
{
    inner: Arc<Inner<T, S>>,
}

impl<T: PeerTransport, S: MessageSigner> Clone for Dispatcher<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T, S> {
    transport: Arc<T>,
    signer: Arc<S>,
    metrics: Arc<dyn DispatcherMetrics>,
    rate_limiter: RateLimiter,
    receivers: ReceiverRegistry,
    config: DispatcherConfig,
    peer_id: PeerId,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl<T, S> Dispatcher<T, S>
where
    T: PeerTransport,
    S: MessageSigner,
{
    /// Create a dispatcher. Nothing runs until [`Dispatcher::start`].
    ///
    /// # Errors
    /// `InvalidRateLimit` or `InvalidConfig` for unusable settings.
    pub fn new(deps: DispatcherDependencies<T, S>) -> Result<Self, DispatcherError> {
        if deps.config.receiver_buffer_size == 0 {
            return Err(DispatcherError::InvalidConfig(
                "receiver buffer size must be positive".to_string(),
            ));
        }
        if deps.config.sender_bucket_ttl.is_zero() {
            return Err(DispatcherError::InvalidConfig(
                "sender bucket ttl must be positive".to_string(),
            ));
        }
        let rate_limiter = RateLimiter::new(&deps.config.rate_limit)?;
        let peer_id = deps.transport.id();

        Ok(Self {
            inner: Arc::new(Inner {
                transport: deps.transport,
                signer: deps.signer,
                metrics: deps.metrics,
                rate_limiter,
                receivers: ReceiverRegistry::default(),
                config: deps.config,
                peer_id,
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        })
    }

    /// This node's peer ID.
    pub fn peer_id(&self) -> PeerId {
        self.inner.peer_id
    }

    /// Number of registered receivers.
    pub fn receiver_count(&self) -> usize {
        self.inner.receivers.len()
    }

    /// Take the transport's inbound stream and spawn the receive loop.
    ///
    /// # Errors
    /// - `Closed` after shutdown
    /// - `AlreadyStarted` if the inbound stream was already taken
    pub fn start(&self) -> Result<(), DispatcherError> {
        if self.inner.cancel.is_cancelled() {
            return Err(DispatcherError::Closed);
        }
        let inbound = self
            .inner
            .transport
            .take_inbound()
            .ok_or(DispatcherError::AlreadyStarted)?;

        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn(receive_loop(inner, inbound));

        info!(peer_id = %self.inner.peer_id, "Capability dispatcher started");
        Ok(())
    }

    /// Stop every task and drop every receiver. Idempotent.
    pub async fn close(&self) {
        self.inner.cancel.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        let dropped = self.inner.receivers.drain().len();
        info!(receivers = dropped, "Capability dispatcher closed");
    }
}

impl<T, S> CapabilityDispatcher for Dispatcher<T, S>
where
    T: PeerTransport,
    S: MessageSigner,
{
    fn send(&self, peer: PeerId, body: MessageBody) -> Result<(), DispatcherError> {
        self.inner.send(peer, body)
    }

    fn set_receiver(
        &self,
        capability_id: &str,
        don_id: DonId,
        receiver: Arc<dyn MessageReceiver>,
    ) -> Result<(), DispatcherError> {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return Err(DispatcherError::Closed);
        }

        let key = ReceiverKey::new(capability_id, don_id);
        let (tx, rx) = mpsc::channel(inner.config.receiver_buffer_size);
        let cancel = inner.cancel.child_token();
        inner.receivers.insert(
            key.clone(),
            ReceiverEntry {
                cancel: cancel.clone(),
                tx,
            },
        )?;
        inner.tracker.spawn(deliver(key, rx, receiver, cancel));

        debug!(capability_id = %capability_id, don_id, "Receiver set");
        Ok(())
    }

    fn remove_receiver(&self, capability_id: &str, don_id: DonId) {
        if let Some(entry) = self
            .inner
            .receivers
            .remove(&ReceiverKey::new(capability_id, don_id))
        {
            entry.cancel.cancel();
            debug!(capability_id = %capability_id, don_id, "Receiver removed");
        }
    }
}

impl<T, S> Inner<T, S>
where
    T: PeerTransport,
    S: MessageSigner,
{
    fn send(&self, peer: PeerId, mut body: MessageBody) -> Result<(), DispatcherError> {
        body.version = self.config.supported_version;
        body.sender = self.peer_id.to_vec();
        body.receiver = peer.to_vec();
        body.timestamp = now_millis();

        let raw_body = body.encode()?;
        let signature = self.signer.sign(&raw_body)?;
        let raw = Message {
            signature,
            body: raw_body,
        }
        .encode()?;

        self.transport.send(peer, raw)?;
        Ok(())
    }

    fn handle_inbound(&self, msg: InboundMessage) {
        if !self.rate_limiter.allow(&msg.sender) {
            warn!(sender = %msg.sender, "Rate limit exceeded, dropping message");
            self.metrics.inc_dropped(DropReason::RateLimited);
            return;
        }

        let body = match validate_message(&msg.payload, &msg.sender, &self.peer_id) {
            Ok(body) => body,
            Err(invalid) => {
                debug!(sender = %msg.sender, error = %invalid.reason, "Received invalid message");
                self.metrics.inc_dropped(DropReason::Invalid);
                if let Some(body) = invalid.body {
                    self.try_respond_with_error(msg.sender, body, ErrorCode::ValidationFailed);
                }
                return;
            }
        };

        let key = ReceiverKey::new(&body.capability_id, body.capability_don_id);
        let Some(tx) = self.receivers.sender(&key) else {
            debug!(
                capability_id = %sanitize_log_string(&key.capability_id),
                don_id = key.don_id,
                "Received message for unregistered capability"
            );
            self.metrics.inc_dropped(DropReason::CapabilityNotFound);
            self.try_respond_with_error(msg.sender, body, ErrorCode::CapabilityNotFound);
            return;
        };

        let max = tx.max_capacity();
        let usage = (max - tx.capacity()) as f64 / max as f64;
        self.metrics
            .set_receive_channel_usage(&key.capability_id, key.don_id, usage);

        match tx.try_send(body) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    capability_id = %sanitize_log_string(&key.capability_id),
                    don_id = key.don_id,
                    "Receiver channel full, dropping message"
                );
                self.metrics.inc_dropped(DropReason::ChannelFull);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    capability_id = %sanitize_log_string(&key.capability_id),
                    don_id = key.don_id,
                    "Receiver is shutting down, dropping message"
                );
            }
        }
    }

    /// Answer `peer` with `code`, unless `body` already carries an error.
    fn try_respond_with_error(&self, peer: PeerId, mut body: MessageBody, code: ErrorCode) {
        if body.error.is_error() {
            return;
        }
        body.error = code;
        body.payload.clear();

        if let Err(e) = self.send(peer, body) {
            debug!(peer = %peer, error = %e, "Failed to send error response");
        }
    }
}

async fn receive_loop<T, S>(inner: Arc<Inner<T, S>>, mut inbound: mpsc::Receiver<InboundMessage>)
where
    T: PeerTransport,
    S: MessageSigner,
{
    let ttl = inner.config.sender_bucket_ttl;
    let mut prune = tokio::time::interval_at(tokio::time::Instant::now() + ttl, ttl);
    prune.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => break,
            _ = prune.tick() => inner.rate_limiter.prune(ttl),
            msg = inbound.recv() => match msg {
                Some(msg) => inner.handle_inbound(msg),
                None => {
                    info!("Inbound stream closed");
                    break;
                }
            },
        }
    }
    debug!("Receive loop exited");
}

async fn deliver(
    key: ReceiverKey,
    mut rx: mpsc::Receiver<MessageBody>,
    receiver: Arc<dyn MessageReceiver>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            body = rx.recv() => {
                let Some(body) = body else { break };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = receiver.receive(body) => {}
                }
            }
        }
    }
    debug!(
        capability_id = %sanitize_log_string(&key.capability_id),
        don_id = key.don_id,
        "Receiver task exited"
    );
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
