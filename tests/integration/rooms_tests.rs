//! Integration tests for targeted room cleaning.

use std::sync::Arc;

use futures_lite::future::block_on;
use roombalink::Error;
use roombalink::app::commands::{CommandName, Region};
use roombalink::connection::ConnectionManager;
use roombalink::dispatcher::CommandDispatcher;
use roombalink::rooms::{MAX_REGIONS, RoomCleaningService};
use roombalink::telemetry::TelemetryFeed;
use serde_json::json;

use crate::mock_transport::{ConnectBehaviour, MockTransport, test_config};

fn connected() -> (ConnectionManager<Arc<MockTransport>>, Arc<MockTransport>) {
    let transport = Arc::new(
        MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept)
            .with_identity(json!({"name": "Rosie"})),
    );
    let mgr = ConnectionManager::new(test_config(), Arc::clone(&transport), transport.feed().clone());
    block_on(mgr.connect()).unwrap();
    (mgr, transport)
}

#[test]
fn empty_selection_sends_nothing() {
    let (mgr, transport) = connected();
    let rooms = RoomCleaningService::new(CommandDispatcher::new(&mgr));
    assert!(matches!(
        rooms.clean_rooms(Some("map1".into()), &[]),
        Err(Error::InvalidCommandParameters(_))
    ));
    assert!(transport.sent().is_empty());
}

#[test]
fn oversized_selection_sends_nothing() {
    let (mgr, transport) = connected();
    let rooms = RoomCleaningService::new(CommandDispatcher::new(&mgr));
    let regions: Vec<Region> = (0..=MAX_REGIONS).map(|i| Region::room(i.to_string())).collect();
    assert!(matches!(
        rooms.clean_rooms(None, &regions),
        Err(Error::InvalidCommandParameters(_))
    ));
    assert!(transport.sent().is_empty());
}

#[test]
fn selection_is_sent_as_clean_rooms() {
    let (mgr, transport) = connected();
    let rooms = RoomCleaningService::new(CommandDispatcher::new(&mgr));
    rooms
        .clean_rooms(Some("map1".into()), &[Region::room("3"), Region::zone("1")])
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, CommandName::CleanRooms);
    assert_eq!(
        sent[0].payload(),
        json!({
            "pmap_id": "map1",
            "regions": [
                {"region_id": "3", "type": "rid"},
                {"region_id": "1", "type": "zid"}
            ]
        })
    );
}

#[test]
fn device_rejection_is_a_region_validation_failure() {
    let (mgr, transport) = connected();
    transport.reject_next("unknown region 9");
    let rooms = RoomCleaningService::new(CommandDispatcher::new(&mgr));
    assert_eq!(
        rooms.clean_rooms(None, &[Region::room("9")]),
        Err(Error::RegionValidationFailure("unknown region 9".into()))
    );
}

#[test]
fn disconnected_session_is_reported_as_such() {
    let (mgr, transport) = connected();
    block_on(mgr.disconnect());
    let rooms = RoomCleaningService::new(CommandDispatcher::new(&mgr));
    assert_eq!(rooms.clean_rooms(None, &[Region::room("1")]), Err(Error::NotConnected));
    assert!(transport.sent().is_empty());
}
