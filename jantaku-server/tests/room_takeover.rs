//! Room lifecycle over a recording transport: readiness, answers through the
//! inbox, and master takeover from a serialized checkpoint.

use std::sync::Arc;

use jantaku_engine::{
    EngineError, GameSettings, ManualClock, Operation, OperationRequest, Phase, ServerEvent, ServerMessage,
    StandardEvaluator,
};
use jantaku_server::{InboundEvent, RecordingTransport, Room, RoomServices, SeededWallSource};

const SEED: [u8; 32] = [0x42; 32];

fn services(transport: &Arc<RecordingTransport>, clock: &Arc<ManualClock>) -> RoomServices {
    RoomServices {
        transport: transport.clone(),
        evaluator: Box::new(StandardEvaluator::default()),
        walls: Box::new(SeededWallSource::new(SEED, 1, 4)),
        clock: clock.clone(),
    }
}

fn humans() -> Vec<String> {
    vec!["alice".to_string(), "bob".to_string()]
}

fn last_request(transport: &RecordingTransport, seat: usize) -> OperationRequest {
    transport
        .messages_for(seat)
        .into_iter()
        .rev()
        .find_map(|m| match m {
            ServerMessage::Request(r) => Some(r),
            ServerMessage::Event(_) => None,
        })
        .expect("seat was asked")
}

/// Opens a room and gets both humans ready; alice (dealer) is then asked to
/// discard.
fn ready_room() -> (Room, Arc<RecordingTransport>, Arc<ManualClock>) {
    let transport = Arc::new(RecordingTransport::new());
    let clock = Arc::new(ManualClock::new(0));
    let mut room = Room::open(GameSettings::four_player(), &humans(), services(&transport, &clock)).unwrap();

    assert!(!room.tick().unwrap(), "humans are not ready yet");
    let epoch = room.driver().epoch();
    let tx = room.sender();
    tx.send(InboundEvent::ready(0, epoch)).unwrap();
    tx.send(InboundEvent::ready(1, epoch)).unwrap();
    assert!(room.tick().unwrap());
    assert!(matches!(room.phase(), Phase::Discard { seat: 0, .. }));
    (room, transport, clock)
}

#[test]
fn humans_receive_events_and_requests() {
    let (room, transport, _clock) = ready_room();
    let to_bob = transport.messages_for(1);
    assert!(matches!(
        to_bob.first(),
        Some(ServerMessage::Event(ServerEvent::LoadingStarted))
    ));
    let round_started = to_bob.iter().find_map(|m| match m {
        ServerMessage::Event(ServerEvent::RoundStarted { view }) => Some(view.clone()),
        _ => None,
    });
    let view = round_started.unwrap();
    assert_eq!(view.viewer, 1);
    assert!(view.seats[1].hand.is_some());
    assert!(view.seats[0].hand.is_none(), "other hands stay hidden");

    let request = last_request(&transport, 0);
    assert_eq!(request.epoch, room.driver().epoch());
    assert!(request.operations[0].is_skip());
    assert!(transport.messages_for(2).is_empty(), "bots get nothing on the wire");
}

#[test]
fn bad_input_is_dropped_without_stalling() {
    let (mut room, transport, _clock) = ready_room();
    let request = last_request(&transport, 0);
    let tx = room.sender();
    tx.send(InboundEvent::operation(1, request.epoch, Operation::skip(), 0)).unwrap();
    tx.send(InboundEvent::operation(0, request.epoch + 7, Operation::skip(), 0)).unwrap();
    assert!(!room.tick().unwrap());
    assert_eq!(room.driver().pending_seats(), vec![0]);

    tx.send(InboundEvent::operation(0, request.epoch, Operation::skip(), 250)).unwrap();
    assert!(room.tick().unwrap());
    assert!(matches!(room.phase(), Phase::OutTurnCollection { .. }));
    let round = room.driver().round().unwrap();
    assert_eq!(round.discards(0).len(), 1);
    assert_eq!(round.bonus_time(0), 20_000 - 250);
}

#[test]
fn takeover_asks_again_and_continues() {
    let (room, old_transport, clock) = ready_room();
    let old_request = last_request(&old_transport, 0);
    let json = room.checkpoint_json().unwrap();
    drop(room);

    let transport = Arc::new(RecordingTransport::new());
    let mut room = Room::take_over_json(&json, services(&transport, &clock)).unwrap();
    assert_eq!(room.driver().epoch(), old_request.epoch + 1);
    assert_eq!(room.driver().seats()[0].name, "alice");
    assert!(room.driver().seats()[3].is_bot);

    let request = last_request(&transport, 0);
    assert_eq!(request.epoch, old_request.epoch + 1);
    assert_eq!(request.operations, old_request.operations);

    // An answer addressed to the old master is stale here.
    let tx = room.sender();
    tx.send(InboundEvent::operation(0, old_request.epoch, Operation::skip(), 0)).unwrap();
    assert!(!room.tick().unwrap());
    assert_eq!(room.driver().pending_seats(), vec![0]);

    tx.send(InboundEvent::operation(0, request.epoch, Operation::skip(), 0)).unwrap();
    assert!(room.tick().unwrap());
    assert_eq!(room.driver().round().unwrap().discards(0).len(), 1);
}

#[test]
fn takeover_rejects_transient_phases() {
    let (room, _transport, clock) = ready_room();
    let mut checkpoint = room.checkpoint();
    checkpoint.phase = Phase::Prepare;
    let transport = Arc::new(RecordingTransport::new());
    assert!(Room::take_over(checkpoint, services(&transport, &clock)).is_err());
}

#[test]
fn missing_player_aborts_the_room() {
    let transport = Arc::new(RecordingTransport::new());
    let clock = Arc::new(ManualClock::new(0));
    let settings = GameSettings::four_player();
    let timeout = settings.wait_for_loading_timeout_ms;
    let mut room = Room::open(settings, &humans(), services(&transport, &clock)).unwrap();
    room.sender()
        .send(InboundEvent::ready(0, room.driver().epoch()))
        .unwrap();
    assert!(!room.tick().unwrap());

    clock.advance(timeout + 1);
    let err = room.tick().unwrap_err();
    assert_eq!(
        err.downcast_ref::<EngineError>(),
        Some(&EngineError::LoadFailure { missing: vec![1] })
    );
    assert!(room.is_finished());
    assert!(transport
        .messages_for(0)
        .iter()
        .any(|m| matches!(m, ServerMessage::Event(ServerEvent::Aborted { .. }))));
}

#[test]
fn bot_only_room_runs_to_the_end() {
    let transport = Arc::new(RecordingTransport::new());
    let clock = Arc::new(ManualClock::new(0));
    let mut room = Room::open(GameSettings::three_player(), &[], services_three(&transport, &clock)).unwrap();
    let mut ticks = 0;
    while !room.is_finished() && ticks < 100_000 {
        room.tick().unwrap();
        ticks += 1;
    }
    assert_eq!(room.phase(), &Phase::GameEnd);
    assert!(transport.take().is_empty());
}

fn services_three(transport: &Arc<RecordingTransport>, clock: &Arc<ManualClock>) -> RoomServices {
    RoomServices {
        walls: Box::new(SeededWallSource::new(SEED, 2, 3)),
        ..services(transport, clock)
    }
}
