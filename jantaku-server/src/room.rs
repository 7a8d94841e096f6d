//! A table with its driver, its seats and its inbox.
//!
//! `Room` is the single owner of a `Driver`. Client answers arrive on the
//! inbox from any thread; `tick` drains them, feeds the driver and lets it
//! evaluate deadlines. Protocol violations from clients are logged and
//! dropped, everything fatal is returned.
//!
//! Master takeover: another process restores the room from a checkpoint with
//! [`Room::take_over`]. The active window is opened again under a new epoch,
//! so every eligible seat is asked again and answers addressed to the old
//! master are rejected as stale.

use std::sync::Arc;

use anyhow::Context;
use crossbeam::channel::Sender;
use jantaku_engine::types::Seat;
use jantaku_engine::{
    BotParticipant, Checkpoint, Clock, Driver, GameSettings, HandEvaluator, Participant, Phase, SeatInfo,
    WallSource,
};

use crate::human::HumanParticipant;
use crate::inbox::{InboundEvent, InboundKind, Inbox};
use crate::transport::Transport;

/// Collaborators a room is built with, on first open and on takeover alike.
pub struct RoomServices {
    pub transport: Arc<dyn Transport>,
    pub evaluator: Box<dyn HandEvaluator>,
    pub walls: Box<dyn WallSource>,
    pub clock: Arc<dyn Clock>,
}

pub struct Room {
    driver: Driver,
    inbox: Inbox,
}

/// Humans take the first seats in the given order; bots fill the rest,
/// numbered from 1.
pub fn seat_order(settings: &GameSettings, humans: &[String]) -> anyhow::Result<Vec<SeatInfo>> {
    anyhow::ensure!(
        humans.len() <= settings.num_seats,
        "{} players for a {}-seat table",
        humans.len(),
        settings.num_seats
    );
    let bots = (1..=settings.num_seats - humans.len()).map(|i| SeatInfo {
        name: format!("Bot {}", i),
        is_bot: true,
    });
    Ok(humans
        .iter()
        .map(|name| SeatInfo {
            name: name.clone(),
            is_bot: false,
        })
        .chain(bots)
        .collect())
}

fn participants(seats: &[SeatInfo], transport: &Arc<dyn Transport>) -> Vec<Box<dyn Participant>> {
    seats
        .iter()
        .enumerate()
        .map(|(seat, info)| -> Box<dyn Participant> {
            if info.is_bot {
                Box::new(BotParticipant::new(seat, info.name.clone()))
            } else {
                Box::new(HumanParticipant::new(seat, info.name.clone(), Arc::clone(transport)))
            }
        })
        .collect()
}

impl Room {
    /// Seats the table and opens the readiness wait.
    pub fn open(settings: GameSettings, humans: &[String], services: RoomServices) -> anyhow::Result<Self> {
        let seats = seat_order(&settings, humans)?;
        let participants = participants(&seats, &services.transport);
        let mut driver = Driver::new(
            settings,
            participants,
            services.evaluator,
            services.walls,
            services.clock,
        )?;
        log::info!(
            "room open: {}",
            seats.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
        );
        driver.start()?;
        Ok(Self {
            driver,
            inbox: Inbox::new(),
        })
    }

    /// Restores a room on this process from another master's checkpoint.
    pub fn take_over(checkpoint: Checkpoint, services: RoomServices) -> anyhow::Result<Self> {
        let participants = participants(&checkpoint.seats, &services.transport);
        let epoch = checkpoint.epoch;
        let driver = Driver::resume(
            checkpoint,
            participants,
            services.evaluator,
            services.walls,
            services.clock,
        )
        .context("resuming from checkpoint")?;
        log::info!(
            "took over table in {} (epoch {} -> {})",
            driver.phase().name(),
            epoch,
            driver.epoch()
        );
        Ok(Self {
            driver,
            inbox: Inbox::new(),
        })
    }

    pub fn take_over_json(json: &str, services: RoomServices) -> anyhow::Result<Self> {
        let checkpoint: Checkpoint = serde_json::from_str(json).context("parsing checkpoint")?;
        Self::take_over(checkpoint, services)
    }

    pub fn sender(&self) -> Sender<InboundEvent> {
        self.inbox.sender()
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn phase(&self) -> &Phase {
        self.driver.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.driver.snapshot()
    }

    pub fn checkpoint_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(&self.driver.snapshot()).context("serializing checkpoint")
    }

    fn apply(&mut self, event: InboundEvent) -> anyhow::Result<()> {
        let seat: Seat = event.seat;
        let result = match event.kind {
            InboundKind::Operation {
                operation,
                spent_bonus_ms,
            } => self
                .driver
                .submit_operation(seat, event.epoch, operation, spent_bonus_ms),
            InboundKind::Ready => self.driver.submit_ready(seat, event.epoch),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                log::warn!("dropping input from seat {}: {}", seat, e);
                Ok(())
            }
        }
    }

    /// Feeds queued client input to the driver, then advances it. Returns
    /// whether the phase changed.
    pub fn tick(&mut self) -> anyhow::Result<bool> {
        for event in self.inbox.drain() {
            self.apply(event)?;
        }
        Ok(self.driver.tick()?)
    }
}
