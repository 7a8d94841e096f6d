use crate::message::{OperationRequest, ServerEvent};
use crate::operation::Operation;
use crate::types::Seat;

/// One seat's decision channel.
///
/// `request` returns `Some` when the answer is available at once (bots);
/// asynchronous seats return `None` and answer later through
/// `Driver::submit_operation`.
pub trait Participant: Send {
    fn seat(&self) -> Seat;
    fn name(&self) -> &str;
    fn is_bot(&self) -> bool;

    /// Asked when the table opens its readiness wait. `true` means the seat
    /// is ready now; otherwise it reports through `Driver::submit_ready`.
    fn request_ready(&mut self) -> bool;

    fn request(&mut self, request: &OperationRequest) -> Option<Operation>;

    fn notify(&mut self, event: &ServerEvent);
}

/// Stand-in seat: ready at once, always passes.
#[derive(Debug, Clone)]
pub struct BotParticipant {
    seat: Seat,
    name: String,
}

impl BotParticipant {
    pub fn new(seat: Seat, name: impl Into<String>) -> Self {
        Self {
            seat,
            name: name.into(),
        }
    }

    pub fn boxed(seat: Seat) -> Box<dyn Participant> {
        Box::new(Self::new(seat, format!("Bot {}", seat + 1)))
    }
}

impl Participant for BotParticipant {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_bot(&self) -> bool {
        true
    }

    fn request_ready(&mut self) -> bool {
        true
    }

    fn request(&mut self, _request: &OperationRequest) -> Option<Operation> {
        Some(Operation::skip())
    }

    fn notify(&mut self, _event: &ServerEvent) {}
}
