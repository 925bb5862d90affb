//! Shared test fixtures.

use async_trait::async_trait;
use dn_01_capability_dispatcher::{
    Dispatcher, DispatcherConfig, DispatcherDependencies, DispatcherError, Ed25519Signer,
    InMemoryNetwork, InMemoryPeer, MessageReceiver, NoopMetrics,
};
use shared_crypto::Ed25519KeyPair;
use shared_types::{MessageBody, PeerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Dispatcher type used across the integration tests.
pub type TestDispatcher = Dispatcher<InMemoryPeer, Ed25519Signer>;

/// Peer ID of the key derived from `seed`.
pub fn peer_id_for(seed: u8) -> PeerId {
    Ed25519Signer::new(Ed25519KeyPair::from_seed([seed; 32])).peer_id()
}

/// Join `network` with the key derived from `seed` and build a dispatcher on it.
pub fn dispatcher_on(
    network: &InMemoryNetwork,
    seed: u8,
    config: DispatcherConfig,
) -> Result<TestDispatcher, DispatcherError> {
    let signer = Ed25519Signer::new(Ed25519KeyPair::from_seed([seed; 32]));
    let transport = network.join(signer.peer_id());
    Dispatcher::new(DispatcherDependencies {
        transport: Arc::new(transport),
        signer: Arc::new(signer),
        metrics: Arc::new(NoopMetrics),
        config,
    })
}

/// Forwards every delivered body to a channel.
pub struct ChannelReceiver {
    tx: mpsc::UnboundedSender<MessageBody>,
}

impl ChannelReceiver {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MessageBody>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl MessageReceiver for ChannelReceiver {
    async fn receive(&self, body: MessageBody) {
        let _ = self.tx.send(body);
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// Next body from `rx`, or `None` after a second.
pub async fn next_body(rx: &mut mpsc::UnboundedReceiver<MessageBody>) -> Option<MessageBody> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .ok()
        .flatten()
}
