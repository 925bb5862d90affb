//! # Dispatcher Messaging Flows
//!
//! Two dispatchers joined to one in-memory network, each with its own
//! Ed25519 identity.
//!
//! ## Flows Tested
//!
//! 1. **Request delivery**: a body sent by A reaches B's receiver for the key
//! 2. **Routing failure**: a body for an unknown key comes back to A as a
//!    `CapabilityNotFound` response
//! 3. **Per-sender limits**: one noisy peer exhausts only its own bucket

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{
        dispatcher_on, eventually, next_body, peer_id_for, ChannelReceiver,
    };
    use dn_01_capability_dispatcher::{
        CapabilityDispatcher, DispatcherConfig, InMemoryNetwork, RateLimiterConfig,
    };
    use shared_types::{ErrorCode, MessageBody};

    const CAP: &str = "ccip@1.0.0";

    // =========================================================================
    // REQUEST DELIVERY
    // =========================================================================

    #[tokio::test]
    async fn test_request_reaches_remote_receiver() {
        let network = InMemoryNetwork::default();
        let a = dispatcher_on(&network, 1, DispatcherConfig::default()).unwrap();
        let b = dispatcher_on(&network, 2, DispatcherConfig::default()).unwrap();
        a.start().unwrap();
        b.start().unwrap();

        let (receiver, mut rx) = ChannelReceiver::new();
        b.set_receiver(CAP, 7, receiver).unwrap();

        let mut body = MessageBody::new(CAP, 7);
        body.caller_don_id = 3;
        body.method = "execute".to_string();
        body.payload = b"report".to_vec();
        a.send(b.peer_id(), body).unwrap();

        let received = next_body(&mut rx).await.unwrap();
        assert_eq!(received.sender, peer_id_for(1).to_vec());
        assert_eq!(received.receiver, b.peer_id().to_vec());
        assert_eq!(received.caller_don_id, 3);
        assert_eq!(received.method, "execute");
        assert_eq!(received.payload, b"report");
        assert_eq!(received.error, ErrorCode::Ok);

        a.close().await;
        b.close().await;
    }

    #[tokio::test]
    async fn test_receivers_isolated_by_don() {
        let network = InMemoryNetwork::default();
        let a = dispatcher_on(&network, 1, DispatcherConfig::default()).unwrap();
        let b = dispatcher_on(&network, 2, DispatcherConfig::default()).unwrap();
        a.start().unwrap();
        b.start().unwrap();

        let (don_7, mut rx_7) = ChannelReceiver::new();
        let (don_8, mut rx_8) = ChannelReceiver::new();
        b.set_receiver(CAP, 7, don_7).unwrap();
        b.set_receiver(CAP, 8, don_8).unwrap();

        a.send(b.peer_id(), MessageBody::new(CAP, 8)).unwrap();

        let received = next_body(&mut rx_8).await.unwrap();
        assert_eq!(received.capability_don_id, 8);
        assert!(rx_7.try_recv().is_err());

        a.close().await;
        b.close().await;
    }

    // =========================================================================
    // ROUTING FAILURE
    // =========================================================================

    #[tokio::test]
    async fn test_unknown_capability_answered_to_sender() {
        let network = InMemoryNetwork::default();
        let a = dispatcher_on(&network, 1, DispatcherConfig::default()).unwrap();
        let b = dispatcher_on(&network, 2, DispatcherConfig::default()).unwrap();
        a.start().unwrap();
        b.start().unwrap();

        // A listens for responses on the key it asked B about.
        let (responses, mut rx) = ChannelReceiver::new();
        a.set_receiver(CAP, 9, responses).unwrap();

        let mut body = MessageBody::new(CAP, 9);
        body.payload = b"request".to_vec();
        a.send(b.peer_id(), body).unwrap();

        let response = next_body(&mut rx).await.unwrap();
        assert_eq!(response.error, ErrorCode::CapabilityNotFound);
        assert_eq!(response.sender, b.peer_id().to_vec());
        assert!(response.payload.is_empty());

        // The error response is not bounced back to B.
        assert!(next_body(&mut rx).await.is_none());

        a.close().await;
        b.close().await;
    }

    // =========================================================================
    // PER-SENDER LIMITS
    // =========================================================================

    #[tokio::test]
    async fn test_noisy_peer_does_not_starve_others() {
        let network = InMemoryNetwork::default();
        let config = DispatcherConfig {
            rate_limit: RateLimiterConfig {
                global_rps: 1000.0,
                global_burst: 1000,
                per_sender_rps: 0.001,
                per_sender_burst: 2,
            },
            ..Default::default()
        };
        let target = dispatcher_on(&network, 1, config).unwrap();
        let noisy = dispatcher_on(&network, 2, DispatcherConfig::default()).unwrap();
        let quiet = dispatcher_on(&network, 3, DispatcherConfig::default()).unwrap();
        target.start().unwrap();

        let (receiver, mut rx) = ChannelReceiver::new();
        target.set_receiver(CAP, 1, receiver).unwrap();

        for _ in 0..5 {
            noisy.send(target.peer_id(), MessageBody::new(CAP, 1)).unwrap();
        }
        let mut from_noisy = 0;
        while next_body(&mut rx).await.is_some() {
            from_noisy += 1;
        }
        assert_eq!(from_noisy, 2);

        quiet.send(target.peer_id(), MessageBody::new(CAP, 1)).unwrap();
        let received = next_body(&mut rx).await.unwrap();
        assert_eq!(received.sender, quiet.peer_id().to_vec());

        target.close().await;
        assert!(eventually(|| target.receiver_count() == 0).await);
    }
}
