//! # Launcher Flows
//!
//! A full [`node_runtime::OracleNode`] whose oracle instances register a
//! dispatcher receiver when started and remove it when closed. Registry
//! changes must therefore show up as routable (or unroutable) keys on the
//! node's dispatcher.
//!
//! ## Flows Tested
//!
//! 1. **Launch**: a new DON's configurations become reachable receivers
//! 2. **Blue-green promotion**: the retired digest stops being routable,
//!    the kept one never goes away
//! 3. **Removal and shutdown**: every receiver disappears

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{
        dispatcher_on, eventually, next_body, peer_id_for, ChannelReceiver, TestDispatcher,
    };
    use async_trait::async_trait;
    use dn_01_capability_dispatcher::{
        CapabilityDispatcher, DispatcherConfig, InMemoryNetwork, InMemoryPeer, MessageReceiver,
    };
    use dn_02_don_launcher::{
        HomeChainReader, OracleCreator, OracleError, OracleInstance, ReaderError,
    };
    use don_telemetry::MetricsHandle;
    use node_runtime::{NodeConfig, NodeDependencies, OracleNode};
    use parking_lot::Mutex;
    use shared_types::{
        ActiveAndCandidate, ConfigDigest, Don, DonId, ErrorCode, LocalRegistry, MessageBody,
        Ocr3ConfigWithMeta, OracleType, PluginType,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const CAP: &str = "ccip@1.0.0";
    const DON: DonId = 1;
    const NODE_SEED: u8 = 1;
    const PEER_SEED: u8 = 2;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn digest(n: u8) -> ConfigDigest {
        ConfigDigest([n; 32])
    }

    fn config(plugin_type: PluginType, n: u8) -> Ocr3ConfigWithMeta {
        if n == 0 {
            return Ocr3ConfigWithMeta::empty(plugin_type);
        }
        let mut config = Ocr3ConfigWithMeta::empty(plugin_type);
        config.config_digest = digest(n);
        config.config_count = u64::from(n);
        config
    }

    #[derive(Default)]
    struct StaticReader {
        configs: Mutex<HashMap<(DonId, PluginType), ActiveAndCandidate>>,
    }

    impl StaticReader {
        fn set(&self, plugin_type: PluginType, active: u8, candidate: u8) {
            self.configs.lock().insert(
                (DON, plugin_type),
                ActiveAndCandidate {
                    active: config(plugin_type, active),
                    candidate: config(plugin_type, candidate),
                },
            );
        }
    }

    #[async_trait]
    impl HomeChainReader for StaticReader {
        async fn get_ocr_configs(
            &self,
            don_id: DonId,
            plugin_type: PluginType,
        ) -> Result<ActiveAndCandidate, ReaderError> {
            Ok(self
                .configs
                .lock()
                .get(&(don_id, plugin_type))
                .cloned()
                .unwrap_or_else(|| ActiveAndCandidate::empty(plugin_type)))
        }
    }

    /// Instances listen on `(digest hex, don_id)` while running.
    struct RegisteringCreator {
        dispatcher: Arc<dyn CapabilityDispatcher>,
        receiver: Arc<dyn MessageReceiver>,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OracleCreator for RegisteringCreator {
        fn oracle_type(&self) -> OracleType {
            OracleType::Plugin
        }

        async fn create(
            &self,
            don: &Don,
            config: &Ocr3ConfigWithMeta,
        ) -> Result<Box<dyn OracleInstance>, OracleError> {
            Ok(Box::new(RegisteringInstance {
                dispatcher: Arc::clone(&self.dispatcher),
                receiver: Arc::clone(&self.receiver),
                closed: Arc::clone(&self.closed),
                capability_id: config.config_digest.to_string(),
                don_id: don.id,
            }))
        }
    }

    struct RegisteringInstance {
        dispatcher: Arc<dyn CapabilityDispatcher>,
        receiver: Arc<dyn MessageReceiver>,
        closed: Arc<AtomicUsize>,
        capability_id: String,
        don_id: DonId,
    }

    #[async_trait]
    impl OracleInstance for RegisteringInstance {
        async fn start(&self) -> Result<(), OracleError> {
            self.dispatcher
                .set_receiver(&self.capability_id, self.don_id, Arc::clone(&self.receiver))
                .map_err(|e| OracleError::Start(e.to_string()))
        }

        async fn close(&self) -> Result<(), OracleError> {
            self.dispatcher
                .remove_receiver(&self.capability_id, self.don_id);
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn don(config_version: u32) -> Don {
        Don {
            id: DON,
            config_version,
            f: 1,
            members: vec![peer_id_for(NODE_SEED), peer_id_for(PEER_SEED)],
            capability_configurations: BTreeMap::from([(CAP.to_string(), Vec::new())]),
            ..Default::default()
        }
    }

    struct Harness {
        node: OracleNode<InMemoryPeer>,
        peer: TestDispatcher,
        reader: Arc<StaticReader>,
        inbox: tokio::sync::mpsc::UnboundedReceiver<MessageBody>,
        closed: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let network = InMemoryNetwork::default();

        let mut config = NodeConfig::default();
        config.security.p2p_key_seed = Some([NODE_SEED; 32]);
        config.launcher.tick_interval = Duration::from_millis(10);

        let reader = Arc::new(StaticReader::default());
        let (receiver, inbox) = ChannelReceiver::new();
        let closed = Arc::new(AtomicUsize::new(0));
        let creator_closed = Arc::clone(&closed);

        let node = OracleNode::new(
            config,
            NodeDependencies {
                transport: Arc::new(network.join(peer_id_for(NODE_SEED))),
                reader: reader.clone(),
                metrics: MetricsHandle::new(),
            },
            move |dispatcher| {
                Arc::new(RegisteringCreator {
                    dispatcher,
                    receiver,
                    closed: creator_closed,
                }) as Arc<dyn OracleCreator>
            },
        )
        .unwrap();
        node.start().unwrap();

        let peer = dispatcher_on(&network, PEER_SEED, DispatcherConfig::default()).unwrap();
        peer.start().unwrap();

        Harness {
            node,
            peer,
            reader,
            inbox,
            closed,
        }
    }

    impl Harness {
        fn receivers(&self) -> usize {
            self.node.dispatcher().receiver_count()
        }

        fn send_to_instance(&self, n: u8) {
            let mut body = MessageBody::new(digest(n).to_string(), DON);
            body.payload = vec![n];
            self.peer.send(self.node.peer_id(), body).unwrap();
        }
    }

    // =========================================================================
    // LAUNCH
    // =========================================================================

    #[tokio::test]
    async fn test_new_don_becomes_routable() {
        let mut h = harness();
        h.reader.set(PluginType::Commit, 1, 0);
        h.reader.set(PluginType::Exec, 2, 0);

        h.node
            .on_registry_update(LocalRegistry::from_dons([don(1)]))
            .unwrap();
        assert!(eventually(|| h.receivers() == 2).await);

        h.send_to_instance(2);
        let received = next_body(&mut h.inbox).await.unwrap();
        assert_eq!(received.capability_id, digest(2).to_string());
        assert_eq!(received.payload, vec![2]);

        h.node.shutdown().await.unwrap();
        h.peer.close().await;
    }

    // =========================================================================
    // BLUE-GREEN PROMOTION
    // =========================================================================

    #[tokio::test]
    async fn test_promotion_retires_only_old_digest() {
        let mut h = harness();
        h.reader.set(PluginType::Commit, 1, 2);
        h.reader.set(PluginType::Exec, 0, 0);
        h.node
            .on_registry_update(LocalRegistry::from_dons([don(1)]))
            .unwrap();
        assert!(eventually(|| h.receivers() == 2).await);

        // Candidate 2 promoted, 1 retired.
        h.reader.set(PluginType::Commit, 2, 0);
        h.node
            .on_registry_update(LocalRegistry::from_dons([don(2)]))
            .unwrap();
        assert!(eventually(|| h.closed.load(Ordering::SeqCst) == 1).await);
        assert_eq!(h.receivers(), 1);

        h.send_to_instance(2);
        assert_eq!(next_body(&mut h.inbox).await.unwrap().payload, vec![2]);

        // The retired digest now answers with CapabilityNotFound.
        let (responses, mut rx) = ChannelReceiver::new();
        h.peer
            .set_receiver(&digest(1).to_string(), DON, responses)
            .unwrap();
        h.send_to_instance(1);
        let response = next_body(&mut rx).await.unwrap();
        assert_eq!(response.error, ErrorCode::CapabilityNotFound);

        h.node.shutdown().await.unwrap();
        h.peer.close().await;
    }

    // =========================================================================
    // REMOVAL AND SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_removed_don_unregisters_receivers() {
        let h = harness();
        h.reader.set(PluginType::Commit, 1, 0);
        h.reader.set(PluginType::Exec, 2, 3);
        h.node
            .on_registry_update(LocalRegistry::from_dons([don(1)]))
            .unwrap();
        assert!(eventually(|| h.receivers() == 3).await);

        h.node.on_registry_update(LocalRegistry::default()).unwrap();
        assert!(eventually(|| h.receivers() == 0).await);
        assert_eq!(h.closed.load(Ordering::SeqCst), 3);

        h.node.shutdown().await.unwrap();
        h.peer.close().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_instance() {
        let h = harness();
        h.reader.set(PluginType::Commit, 1, 2);
        h.reader.set(PluginType::Exec, 3, 0);
        h.node
            .on_registry_update(LocalRegistry::from_dons([don(1)]))
            .unwrap();
        assert!(eventually(|| h.receivers() == 3).await);

        h.node.shutdown().await.unwrap();
        assert_eq!(h.closed.load(Ordering::SeqCst), 3);
        assert_eq!(h.receivers(), 0);
        h.peer.close().await;
    }
}
