//! Payloads exchanged with participants.
//!
//! Everything here is a snapshot. Nothing holds a reference into the live
//! `RoundState`, so payloads can be queued, serialized and sent after the
//! state has moved on.

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::state::DiscardedTile;
use crate::types::{Meld, PointInfo, Seat, Transfer};

/// What one seat may see of another seat (or of itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: Seat,
    pub name: String,
    pub is_bot: bool,
    /// Concealed tiles. Only present in the owner's own view.
    pub hand: Option<Vec<u8>>,
    /// Drawn tile not yet merged into the hand. Only in the owner's view.
    pub last_draw: Option<u8>,
    /// Concealed tile count including an undiscarded draw.
    pub hand_count: usize,
    pub melds: Vec<Meld>,
    pub discards: Vec<DiscardedTile>,
    pub bei_doras: Vec<u8>,
    pub riichi: bool,
    pub score: i32,
    pub bonus_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallView {
    pub live_remaining: usize,
    pub dora_indicators: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub viewer: Seat,
    pub dealer: Seat,
    pub round_index: u32,
    pub extra: u32,
    pub sticks: u32,
    pub current_seat: Seat,
    pub seats: Vec<SeatView>,
    pub wall: WallView,
}

/// Which decision a request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RequestWindow {
    /// The seat's own turn: discard, or declare tsumo/kong/riichi/...
    InTurn { after_claim: bool },
    /// React to another seat's discard.
    Discard { discarder: Seat, tile: u8 },
    RobKong { seat: Seat, tile: u8 },
    RobBeiDora { seat: Seat, tile: u8 },
}

/// Sent to an eligible seat when a collection window opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Echo this back with the answer; answers with an older epoch are dropped.
    pub epoch: u64,
    pub seat: Seat,
    pub window: RequestWindow,
    pub view: RoundView,
    /// Legal answers. `Skip` is always among them.
    pub operations: Vec<Operation>,
    pub bonus_time_ms: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    Exhausted,
    NineOrphans,
    FourWinds,
    FourKongs,
    FourRiichi,
    ThreeRong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    LoadingStarted,
    RoundStarted {
        view: RoundView,
    },
    TileDiscarded {
        seat: Seat,
        tile: u8,
        tsumogiri: bool,
        riichi: bool,
    },
    RiichiAccepted {
        seat: Seat,
    },
    MeldClaimed {
        seat: Seat,
        from: Seat,
        meld: Meld,
    },
    KongDeclared {
        seat: Seat,
        meld: Meld,
        dora_indicators: Vec<u8>,
    },
    BeiDoraDeclared {
        seat: Seat,
        tile: u8,
    },
    Won {
        winners: Vec<(Seat, PointInfo)>,
        /// `None` for a self-drawn win.
        loser: Option<Seat>,
        tile: u8,
        ura_dora_indicators: Vec<u8>,
    },
    RoundDrawn {
        reason: DrawReason,
        ready: Vec<Seat>,
    },
    PointsTransferred {
        transfers: Vec<Transfer>,
        scores: Vec<i32>,
    },
    GameEnded {
        scores: Vec<i32>,
    },
    Aborted {
        reason: String,
    },
}

/// Envelope handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body")]
pub enum ServerMessage {
    Request(OperationRequest),
    Event(ServerEvent),
}
