//! Single-threaded driver loop.
//!
//! The driver owns the round, the participants and the active phase. All
//! external input goes through [`Driver::submit_operation`],
//! [`Driver::submit_ready`] and [`Driver::tick`]; nothing else mutates the
//! table.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::collector::{Collection, Completion};
use crate::errors::{EngineError, EngineResult};
use crate::evaluator::HandEvaluator;
use crate::message::ServerEvent;
use crate::operation::Operation;
use crate::participant::Participant;
use crate::phase::{Phase, PhaseContext, Step};
use crate::settings::GameSettings;
use crate::state::{RoundState, SeatInfo, WallSource};
use crate::types::Seat;

/// Immediate transitions allowed inside one call before the driver gives up.
pub const MAX_CHAINED_TRANSITIONS: usize = 64;

/// Everything needed to rebuild a driver on another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub settings: GameSettings,
    pub seats: Vec<SeatInfo>,
    pub round: Option<RoundState>,
    pub phase: Phase,
    pub epoch: u64,
}

pub struct Driver {
    settings: GameSettings,
    evaluator: Box<dyn HandEvaluator>,
    walls: Box<dyn WallSource>,
    participants: Vec<Box<dyn Participant>>,
    seats: Vec<SeatInfo>,
    clock: Arc<dyn Clock>,
    round: Option<RoundState>,
    phase: Phase,
    collection: Option<Collection>,
    epoch: u64,
}

impl Driver {
    pub fn new(
        settings: GameSettings,
        participants: Vec<Box<dyn Participant>>,
        evaluator: Box<dyn HandEvaluator>,
        walls: Box<dyn WallSource>,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        settings.validate()?;
        if participants.len() != settings.num_seats {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "{} participants for a {}-seat table",
                    participants.len(),
                    settings.num_seats
                ),
            });
        }
        if let Some((i, p)) = participants.iter().enumerate().find(|(i, p)| p.seat() != *i) {
            return Err(EngineError::InvalidConfig {
                message: format!("participant at index {} claims seat {}", i, p.seat()),
            });
        }
        let seats = participants
            .iter()
            .map(|p| SeatInfo {
                name: p.name().to_string(),
                is_bot: p.is_bot(),
            })
            .collect();

        Ok(Self {
            settings,
            evaluator,
            walls,
            participants,
            seats,
            clock,
            round: None,
            phase: Phase::WaitForLoading,
            collection: None,
            epoch: 0,
        })
    }

    /// Rebuilds a driver from a checkpoint and re-enters its phase, so every
    /// eligible seat is asked again.
    pub fn resume(
        checkpoint: Checkpoint,
        participants: Vec<Box<dyn Participant>>,
        evaluator: Box<dyn HandEvaluator>,
        walls: Box<dyn WallSource>,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        if !checkpoint.phase.is_resumable() {
            return Err(EngineError::InvalidConfig {
                message: format!("cannot resume in phase {}", checkpoint.phase.name()),
            });
        }
        if let Some(round) = &checkpoint.round {
            round.verify()?;
        }
        let mut driver = Self::new(checkpoint.settings, participants, evaluator, walls, clock)?;
        driver.seats = checkpoint.seats;
        driver.round = checkpoint.round;
        driver.epoch = checkpoint.epoch;
        log::info!(
            "resuming in {} from epoch {}",
            checkpoint.phase.name(),
            checkpoint.epoch
        );
        if checkpoint.phase.is_terminal() {
            driver.phase = checkpoint.phase;
        } else {
            driver.enter_phase(checkpoint.phase)?;
        }
        Ok(driver)
    }

    pub fn start(&mut self) -> EngineResult<()> {
        self.enter_phase(Phase::WaitForLoading)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn seats(&self) -> &[SeatInfo] {
        &self.seats
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Seats the open window is still waiting on.
    pub fn pending_seats(&self) -> Vec<Seat> {
        self.collection
            .as_ref()
            .map(|c| c.collector.pending_seats())
            .unwrap_or_default()
    }

    /// Deadline of the open window, if any.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.collection.as_ref().map(|c| c.collector.deadline_ms())
    }

    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            settings: self.settings.clone(),
            seats: self.seats.clone(),
            round: self.round.clone(),
            phase: self.phase.clone(),
            epoch: self.epoch,
        }
    }

    fn context(&mut self) -> PhaseContext<'_> {
        PhaseContext {
            settings: &self.settings,
            evaluator: self.evaluator.as_ref(),
            walls: self.walls.as_mut(),
            participants: &mut self.participants,
            seats: &self.seats,
            round: &mut self.round,
            now_ms: self.clock.now_ms(),
            epoch: self.epoch,
        }
    }

    /// Enters `phase` and follows immediate transitions until a phase waits
    /// for input or halts. Any error aborts the game.
    pub fn enter_phase(&mut self, phase: Phase) -> EngineResult<()> {
        self.run_chain(phase).map_err(|e| self.abort(e))
    }

    fn run_chain(&mut self, mut phase: Phase) -> EngineResult<()> {
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            self.epoch += 1;
            self.collection = None;
            self.phase = phase.clone();
            log::debug!("epoch {}: entering {}", self.epoch, phase.name());

            let step = {
                let mut ctx = self.context();
                phase.enter(&mut ctx)?
            };
            if let Some(round) = &self.round {
                round.verify()?;
            }
            match step {
                Step::Next(next) => phase = next,
                Step::Collect(collection) => {
                    self.collection = Some(collection);
                    return Ok(());
                }
                Step::Halt => return Ok(()),
            }
        }
        Err(EngineError::invariant(format!(
            "more than {} immediate transitions from {}",
            MAX_CHAINED_TRANSITIONS,
            self.phase.name()
        )))
    }

    fn abort(&mut self, err: EngineError) -> EngineError {
        log::error!("aborting game in {}: {}", self.phase.name(), err);
        let reason = err.to_string();
        self.collection = None;
        self.epoch += 1;
        self.phase = Phase::Abort { reason: reason.clone() };
        let event = ServerEvent::Aborted { reason };
        for participant in self.participants.iter_mut() {
            participant.notify(&event);
        }
        err
    }

    /// Records an answer for the open window.
    ///
    /// Answers tagged with another epoch, from seats that are not eligible,
    /// or repeated are rejected with `ProtocolViolation` and change nothing.
    /// `spent_bonus_ms` is charged to the seat even for a Skip.
    pub fn submit_operation(
        &mut self,
        seat: Seat,
        epoch: u64,
        operation: Operation,
        spent_bonus_ms: u64,
    ) -> EngineResult<()> {
        if epoch != self.epoch {
            return Err(EngineError::protocol(
                seat,
                format!("stale epoch {} (current {})", epoch, self.epoch),
            ));
        }
        if matches!(self.phase, Phase::WaitForLoading) {
            return Err(EngineError::protocol(seat, "operation during the readiness wait"));
        }
        let collection = self
            .collection
            .as_mut()
            .ok_or_else(|| EngineError::protocol(seat, "no window is open"))?;
        collection.collector.record(seat, operation)?;
        if let Some(round) = self.round.as_mut() {
            round.spend_bonus_time(seat, spent_bonus_ms);
        }
        Ok(())
    }

    pub fn submit_ready(&mut self, seat: Seat, epoch: u64) -> EngineResult<()> {
        if epoch != self.epoch || !matches!(self.phase, Phase::WaitForLoading) {
            return Err(EngineError::protocol(seat, "not waiting for readiness"));
        }
        let collection = self
            .collection
            .as_mut()
            .ok_or_else(|| EngineError::protocol(seat, "no window is open"))?;
        collection.collector.record(seat, Operation::skip())
    }

    /// Evaluates completion and deadlines of the open window. Returns
    /// whether the phase changed.
    pub fn tick(&mut self) -> EngineResult<bool> {
        let Some(mut collection) = self.collection.take() else {
            return Ok(false);
        };
        let now_ms = self.clock.now_ms();
        let completion = match self.phase.poll(&mut collection, now_ms) {
            Ok(c) => c,
            Err(e) => return Err(self.abort(e)),
        };
        if completion == Completion::Pending {
            self.collection = Some(collection);
            return Ok(false);
        }

        let burn = self.settings.burn_bonus_time_on_timeout;
        if let (true, Some(round), Completion::Complete { timed_out: true }) = (burn, self.round.as_mut(), completion) {
            for &seat in collection.collector.forced_seats() {
                round.spend_bonus_time(seat, u64::MAX);
            }
        }

        let phase = self.phase.clone();
        let next = {
            let mut ctx = self.context();
            phase.complete(&mut ctx, collection)
        };
        match next.and_then(|p| self.run_chain(p)) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.abort(e)),
        }
    }
}
