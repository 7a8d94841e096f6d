pub mod agari;
pub mod clock;
pub mod collector;
pub mod driver;
pub mod errors;
pub mod evaluator;
pub mod message;
pub mod operation;
pub mod participant;
pub mod phase;
pub mod resolver;
pub mod settings;
pub mod state;
pub mod tile;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use driver::{Checkpoint, Driver};
pub use errors::{EngineError, EngineResult};
pub use evaluator::{HandEvaluator, StandardEvaluator};
pub use message::{OperationRequest, RequestWindow, ServerEvent, ServerMessage};
pub use operation::{Operation, OperationKind};
pub use participant::{BotParticipant, Participant};
pub use phase::Phase;
pub use settings::GameSettings;
pub use state::{FixedWallSource, RoundKey, RoundState, SeatInfo, WallBuilder, WallSource};
