//! The phase state machine.
//!
//! A [`Phase`] is a plain serializable descriptor: the variant names the
//! phase and carries only its own parameters. The driver enters a phase,
//! which either moves on at once ([`Step::Next`]), opens a collection window
//! ([`Step::Collect`]) that the driver polls on every tick, or halts.

use serde::{Deserialize, Serialize};

use crate::collector::{Collection, Completion, OperationCollector};
use crate::errors::{EngineError, EngineResult};
use crate::evaluator::HandEvaluator;
use crate::message::{DrawReason, OperationRequest, RequestWindow, ServerEvent};
use crate::operation::Operation;
use crate::participant::Participant;
use crate::settings::GameSettings;
use crate::state::{RoundState, SeatInfo, WallSource};
use crate::types::{PointInfo, Seat, Transfer};

mod claim;
mod kong;
mod loading;
mod settlement;
mod turn;

pub use claim::ClaimWindow;
pub use settlement::{rong_transfers, tsumo_transfers, noten_transfers};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum Phase {
    WaitForLoading,
    Prepare,
    RoundStart {
        /// Rotate the dealer.
        next: bool,
        /// Count a repeat round; otherwise the counter resets.
        extra: bool,
        keep_sticks: bool,
    },
    Draw {
        seat: Seat,
        /// Draw from the replacement pool.
        replacement: bool,
        ling_shang: bool,
        turn_dora_after_discard: bool,
    },
    Discard {
        seat: Seat,
        after_claim: bool,
        ling_shang: bool,
        turn_dora_after_discard: bool,
    },
    OutTurnCollection {
        window: ClaimWindow,
    },
    OperationPerform {
        seat: Seat,
        discarder: Seat,
        operation: Operation,
    },
    Kong {
        seat: Seat,
        operation: Operation,
    },
    BeiDora {
        seat: Seat,
        tile: u8,
    },
    Tsumo {
        seat: Seat,
        tile: u8,
        point: PointInfo,
    },
    Rong {
        discarder: Seat,
        tile: u8,
        winners: Vec<(Seat, PointInfo)>,
        rob_kong: bool,
    },
    RoundDraw {
        reason: DrawReason,
    },
    PointTransfer {
        transfers: Vec<Transfer>,
        next: bool,
        extra: bool,
        keep_sticks: bool,
    },
    GameEnd,
    Abort {
        reason: String,
    },
}

/// Outcome of entering a phase.
#[derive(Debug)]
pub enum Step {
    Next(Phase),
    Collect(Collection),
    Halt,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::WaitForLoading => "WaitForLoading",
            Phase::Prepare => "Prepare",
            Phase::RoundStart { .. } => "RoundStart",
            Phase::Draw { .. } => "Draw",
            Phase::Discard { .. } => "Discard",
            Phase::OutTurnCollection { .. } => "OutTurnCollection",
            Phase::OperationPerform { .. } => "OperationPerform",
            Phase::Kong { .. } => "Kong",
            Phase::BeiDora { .. } => "BeiDora",
            Phase::Tsumo { .. } => "Tsumo",
            Phase::Rong { .. } => "Rong",
            Phase::RoundDraw { .. } => "RoundDraw",
            Phase::PointTransfer { .. } => "PointTransfer",
            Phase::GameEnd => "GameEnd",
            Phase::Abort { .. } => "Abort",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::GameEnd | Phase::Abort { .. })
    }

    /// Phases a driver can rest in, and so the only ones a checkpoint can
    /// hold.
    pub fn is_resumable(&self) -> bool {
        self.is_terminal()
            || matches!(
                self,
                Phase::WaitForLoading | Phase::Discard { .. } | Phase::OutTurnCollection { .. }
            )
    }

    pub fn enter(&self, ctx: &mut PhaseContext<'_>) -> EngineResult<Step> {
        match self {
            Phase::WaitForLoading => loading::enter_wait_for_loading(ctx),
            Phase::Prepare => loading::enter_prepare(ctx),
            Phase::RoundStart {
                next,
                extra,
                keep_sticks,
            } => loading::enter_round_start(ctx, *next, *extra, *keep_sticks),
            Phase::Draw {
                seat,
                replacement,
                ling_shang,
                turn_dora_after_discard,
            } => turn::enter_draw(ctx, *seat, *replacement, *ling_shang, *turn_dora_after_discard),
            Phase::Discard {
                seat, after_claim, ling_shang, ..
            } => turn::enter_discard(ctx, *seat, *after_claim, *ling_shang),
            Phase::OutTurnCollection { window } => claim::enter_out_turn(ctx, window),
            Phase::OperationPerform {
                seat,
                discarder,
                operation,
            } => claim::enter_operation_perform(ctx, *seat, *discarder, operation),
            Phase::Kong { seat, operation } => kong::enter_kong(ctx, *seat, operation),
            Phase::BeiDora { seat, tile } => kong::enter_bei_dora(ctx, *seat, *tile),
            Phase::Tsumo { seat, tile, point } => settlement::enter_tsumo(ctx, *seat, *tile, point),
            Phase::Rong {
                discarder,
                tile,
                winners,
                ..
            } => settlement::enter_rong(ctx, *discarder, *tile, winners),
            Phase::RoundDraw { reason } => settlement::enter_round_draw(ctx, *reason),
            Phase::PointTransfer {
                transfers,
                next,
                extra,
                keep_sticks,
            } => settlement::enter_point_transfer(ctx, transfers, *next, *extra, *keep_sticks),
            Phase::GameEnd => settlement::enter_game_end(ctx),
            Phase::Abort { reason } => {
                ctx.broadcast(&ServerEvent::Aborted { reason: reason.clone() });
                Ok(Step::Halt)
            }
        }
    }

    /// Checks whether the open window is done.
    pub fn poll(&self, collection: &mut Collection, now_ms: u64) -> EngineResult<Completion> {
        match self {
            Phase::WaitForLoading => loading::poll_loading(collection, now_ms),
            _ => Ok(collection.collector.poll(now_ms)),
        }
    }

    /// Resolves a completed window into the next phase.
    pub fn complete(&self, ctx: &mut PhaseContext<'_>, collection: Collection) -> EngineResult<Phase> {
        match self {
            Phase::WaitForLoading => Ok(Phase::Prepare),
            Phase::Discard {
                seat,
                turn_dora_after_discard,
                ..
            } => turn::complete_discard(ctx, *seat, *turn_dora_after_discard, &collection),
            Phase::OutTurnCollection { window } => claim::complete_out_turn(ctx, window, &collection),
            other => Err(EngineError::invariant(format!(
                "{} does not collect operations",
                other.name()
            ))),
        }
    }
}

/// Everything a phase may touch while it runs.
pub struct PhaseContext<'a> {
    pub settings: &'a GameSettings,
    pub evaluator: &'a dyn HandEvaluator,
    pub walls: &'a mut dyn WallSource,
    pub participants: &'a mut [Box<dyn Participant>],
    pub seats: &'a [SeatInfo],
    pub round: &'a mut Option<RoundState>,
    pub now_ms: u64,
    pub epoch: u64,
}

/// Split out of `PhaseContext` so the round can be borrowed next to other
/// context fields.
pub(crate) fn round_of(round: &mut Option<RoundState>) -> EngineResult<&mut RoundState> {
    round
        .as_mut()
        .ok_or_else(|| EngineError::invariant("no round in progress"))
}

impl PhaseContext<'_> {
    pub fn round(&self) -> EngineResult<&RoundState> {
        self.round
            .as_ref()
            .ok_or_else(|| EngineError::invariant("no round in progress"))
    }

    pub fn broadcast(&mut self, event: &ServerEvent) {
        for participant in self.participants.iter_mut() {
            participant.notify(event);
        }
    }

    /// Opens a window for the seats in `offers`, sends each its request and
    /// records immediate answers.
    pub fn open_window(&mut self, window: RequestWindow, offers: Vec<(Seat, Vec<Operation>)>) -> EngineResult<Collection> {
        let round = self
            .round
            .as_ref()
            .ok_or_else(|| EngineError::invariant("no round in progress"))?;
        let num_seats = round.num_seats;
        let eligible: Vec<Seat> = offers.iter().map(|(seat, _)| *seat).collect();
        let timeout_ms = self.settings.server_timeout_ms(round.max_bonus_time(&eligible));
        let mut collector = OperationCollector::open(num_seats, &eligible, self.now_ms, timeout_ms);
        let mut legal = vec![Vec::new(); num_seats];

        for (seat, operations) in offers {
            let request = OperationRequest {
                epoch: self.epoch,
                seat,
                window: window.clone(),
                view: round.view_for(seat),
                operations: operations.clone(),
                bonus_time_ms: round.bonus_time(seat),
                timeout_ms,
            };
            let slot = legal
                .get_mut(seat)
                .ok_or_else(|| EngineError::invariant(format!("offer for unknown seat {}", seat)))?;
            *slot = operations;
            let participant = self
                .participants
                .get_mut(seat)
                .ok_or_else(|| EngineError::invariant(format!("no participant for seat {}", seat)))?;
            if let Some(answer) = participant.request(&request) {
                collector.record(seat, answer)?;
            }
        }
        log::debug!(
            "epoch {}: window {:?} open for seats {:?}, timeout {} ms",
            self.epoch,
            window,
            eligible,
            timeout_ms
        );
        Ok(Collection::new(collector, legal, Some(window)))
    }
}
