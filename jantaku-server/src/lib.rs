//! Table orchestration around `jantaku-engine`.
//!
//! Networked seats, the inbound answer queue, rooms with master takeover,
//! deterministic wall seeding and bot-only batch simulation.

pub mod human;
pub mod inbox;
pub mod room;
pub mod seeding;
pub mod simulator;
pub mod transport;

pub use human::HumanParticipant;
pub use inbox::{InboundEvent, InboundKind, Inbox};
pub use room::{Room, RoomServices};
pub use seeding::SeededWallSource;
pub use transport::{ChannelTransport, RecordingTransport, Transport};
