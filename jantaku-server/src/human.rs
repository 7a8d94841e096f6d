use std::sync::Arc;

use jantaku_engine::types::Seat;
use jantaku_engine::{Operation, OperationRequest, Participant, ServerEvent, ServerMessage};

use crate::transport::Transport;

/// A networked seat. Requests and events go out over the transport; answers
/// come back through the room's inbox, so `request` never answers inline.
pub struct HumanParticipant {
    seat: Seat,
    name: String,
    transport: Arc<dyn Transport>,
}

impl HumanParticipant {
    pub fn new(seat: Seat, name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            seat,
            name: name.into(),
            transport,
        }
    }

    fn send(&self, message: ServerMessage) {
        // A dropped message is recovered by the window timeout.
        if let Err(e) = self.transport.send(self.seat, &message) {
            log::warn!("seat {} ({}): {:#}", self.seat, self.name, e);
        }
    }
}

impl Participant for HumanParticipant {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_bot(&self) -> bool {
        false
    }

    fn request_ready(&mut self) -> bool {
        false
    }

    fn request(&mut self, request: &OperationRequest) -> Option<Operation> {
        self.send(ServerMessage::Request(request.clone()));
        None
    }

    fn notify(&mut self, event: &ServerEvent) {
        self.send(ServerMessage::Event(event.clone()));
    }
}
