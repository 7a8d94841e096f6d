//! Inbound client answers.
//!
//! Socket readers push `InboundEvent`s from any thread; the room drains them
//! on its own thread before each tick.

use anyhow::Context;
use crossbeam::channel::{self, Receiver, Sender};
use jantaku_engine::types::Seat;
use jantaku_engine::Operation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub seat: Seat,
    /// Epoch of the request being answered.
    pub epoch: u64,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundKind {
    Operation {
        operation: Operation,
        /// Bonus time the client spent deciding.
        #[serde(default)]
        spent_bonus_ms: u64,
    },
    Ready,
}

impl InboundEvent {
    pub fn operation(seat: Seat, epoch: u64, operation: Operation, spent_bonus_ms: u64) -> Self {
        Self {
            seat,
            epoch,
            kind: InboundKind::Operation {
                operation,
                spent_bonus_ms,
            },
        }
    }

    pub fn ready(seat: Seat, epoch: u64) -> Self {
        Self {
            seat,
            epoch,
            kind: InboundKind::Ready,
        }
    }

    pub fn from_json(frame: &str) -> anyhow::Result<Self> {
        serde_json::from_str(frame).context("malformed inbound frame")
    }
}

pub struct Inbox {
    tx: Sender<InboundEvent>,
    rx: Receiver<InboundEvent>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// Handle for producers; clone freely.
    pub fn sender(&self) -> Sender<InboundEvent> {
        self.tx.clone()
    }

    /// Everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<InboundEvent> {
        self.rx.try_iter().collect()
    }
}
