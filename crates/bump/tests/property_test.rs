// Property tests for the bridge event mapping

use bump::{
    BridgeState, ConnectOutcome, ConnectedPeer, ConnectionBridge, CorrelationToken, FailReason,
    OutwardEvent, PeerTransport, Result,
};
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug)]
struct NullTransport;

#[async_trait]
impl PeerTransport for NullTransport {
    async fn send(&self, _chunk: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<OutwardEvent>) -> Vec<OutwardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn connected_bridge(name: &str) -> (ConnectionBridge, mpsc::UnboundedReceiver<OutwardEvent>, CorrelationToken) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut bridge = ConnectionBridge::new(Arc::new(tx));
    let token = CorrelationToken::new();
    bridge.begin_attempt(token).unwrap();

    tokio_test::block_on(bridge.on_external_connect_result(
        token,
        ConnectOutcome::Connected(ConnectedPeer {
            peer_username: name.to_string(),
            transport: Box::new(NullTransport),
        }),
    ));
    drain(&mut rx);
    (bridge, rx, token)
}

fn fail_reason() -> impl Strategy<Value = FailReason> {
    prop_oneof![
        Just(FailReason::UserCanceled),
        Just(FailReason::NetworkUnavailable),
        Just(FailReason::InvalidAuthorization),
        "[A-Z_]{1,24}".prop_map(FailReason::Other),
    ]
}

proptest! {
    #[test]
    fn prop_success_emits_single_connected(name in "[a-zA-Z0-9_]{1,32}") {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = ConnectionBridge::new(Arc::new(tx));
        let token = CorrelationToken::new();
        bridge.begin_attempt(token).unwrap();

        tokio_test::block_on(bridge.on_external_connect_result(
            token,
            ConnectOutcome::Connected(ConnectedPeer {
                peer_username: name.clone(),
                transport: Box::new(NullTransport),
            }),
        ));

        prop_assert_eq!(bridge.state(), BridgeState::Connected);
        prop_assert_eq!(drain(&mut rx), vec![OutwardEvent::Connected { peer_username: name }]);
    }

    #[test]
    fn prop_failure_maps_to_cancel_or_error(reason in fail_reason()) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = ConnectionBridge::new(Arc::new(tx));
        let token = CorrelationToken::new();
        bridge.begin_attempt(token).unwrap();

        tokio_test::block_on(bridge.on_external_connect_result(token, ConnectOutcome::Failed(reason.clone())));

        prop_assert_eq!(bridge.state(), BridgeState::Idle);
        let events = drain(&mut rx);
        prop_assert_eq!(events.len(), 1);
        if reason == FailReason::UserCanceled {
            prop_assert!(matches!(events[0], OutwardEvent::Cancel { .. }), "expected Cancel event");
        } else {
            prop_assert!(matches!(events[0], OutwardEvent::Error { .. }), "expected Error event");
        }
    }

    #[test]
    fn prop_invalid_utf8_never_emits_data(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(std::str::from_utf8(&bytes).is_err());
        let (mut bridge, mut rx, token) = connected_bridge("alice");

        bridge.on_data_received(token, bytes);

        prop_assert_eq!(bridge.state(), BridgeState::Connected);
        prop_assert_eq!(drain(&mut rx), vec![OutwardEvent::error("Failed to parse incoming data")]);
    }

    #[test]
    fn prop_valid_utf8_is_delivered_verbatim(text in any::<String>()) {
        let (mut bridge, mut rx, token) = connected_bridge("alice");

        bridge.on_data_received(token, text.clone().into_bytes());

        prop_assert_eq!(drain(&mut rx), vec![OutwardEvent::Data { payload: text }]);
    }
}
