//! Per-window response table with a deadline.

use crate::errors::{EngineError, EngineResult};
use crate::message::RequestWindow;
use crate::operation::Operation;
use crate::types::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Pending,
    /// Every eligible seat has an answer. `timed_out` is set when some of
    /// them were forced to Skip.
    Complete { timed_out: bool },
}

#[derive(Debug, Clone)]
pub struct OperationCollector {
    eligible: Vec<bool>,
    responses: Vec<Option<Operation>>,
    opened_at_ms: u64,
    timeout_ms: u64,
    timed_out: bool,
    forced: Vec<Seat>,
}

impl OperationCollector {
    pub fn open(num_seats: usize, eligible: &[Seat], now_ms: u64, timeout_ms: u64) -> Self {
        let mut flags = vec![false; num_seats];
        for &seat in eligible {
            if let Some(f) = flags.get_mut(seat) {
                *f = true;
            }
        }
        Self {
            eligible: flags,
            responses: vec![None; num_seats],
            opened_at_ms: now_ms,
            timeout_ms,
            timed_out: false,
            forced: Vec::new(),
        }
    }

    pub fn is_eligible(&self, seat: Seat) -> bool {
        self.eligible.get(seat).copied().unwrap_or(false)
    }

    pub fn eligible_seats(&self) -> Vec<Seat> {
        (0..self.eligible.len()).filter(|&s| self.eligible[s]).collect()
    }

    /// Records an answer. Ineligible and repeated answers are rejected.
    pub fn record(&mut self, seat: Seat, operation: Operation) -> EngineResult<()> {
        if !self.is_eligible(seat) {
            return Err(EngineError::protocol(seat, "seat is not eligible in this window"));
        }
        let slot = &mut self.responses[seat];
        if slot.is_some() {
            return Err(EngineError::protocol(seat, "duplicate response"));
        }
        *slot = Some(operation);
        Ok(())
    }

    pub fn has_responded(&self, seat: Seat) -> bool {
        self.responses.get(seat).is_some_and(Option::is_some)
    }

    pub fn pending_seats(&self) -> Vec<Seat> {
        self.eligible_seats()
            .into_iter()
            .filter(|&s| self.responses[s].is_none())
            .collect()
    }

    pub fn deadline_ms(&self) -> u64 {
        self.opened_at_ms + self.timeout_ms
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.opened_at_ms) > self.timeout_ms
    }

    /// Forces Skip on every seat still pending. Returns the forced seats.
    pub fn force_skip_pending(&mut self) -> Vec<Seat> {
        let pending = self.pending_seats();
        for &seat in &pending {
            self.responses[seat] = Some(Operation::skip());
        }
        if !pending.is_empty() {
            self.timed_out = true;
            self.forced.extend(&pending);
        }
        pending
    }

    /// Completion check. Past the deadline, pending seats become Skip.
    pub fn poll(&mut self, now_ms: u64) -> Completion {
        if self.pending_seats().is_empty() {
            return Completion::Complete {
                timed_out: self.timed_out,
            };
        }
        if self.is_expired(now_ms) {
            let forced = self.force_skip_pending();
            log::info!("collection timed out; forcing skip for seats {:?}", forced);
            return Completion::Complete { timed_out: true };
        }
        Completion::Pending
    }

    /// Seats whose Skip was forced by the deadline.
    pub fn forced_seats(&self) -> &[Seat] {
        &self.forced
    }

    /// The response table, one entry per seat. Ineligible seats are `None`.
    pub fn responses(&self) -> &[Option<Operation>] {
        &self.responses
    }
}

/// An open collection window: the collector plus what was offered.
#[derive(Debug, Clone)]
pub struct Collection {
    pub collector: OperationCollector,
    /// Offered operations per seat (empty for ineligible seats).
    pub legal: Vec<Vec<Operation>>,
    pub window: Option<RequestWindow>,
}

impl Collection {
    pub fn new(collector: OperationCollector, legal: Vec<Vec<Operation>>, window: Option<RequestWindow>) -> Self {
        Self {
            collector,
            legal,
            window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;

    fn open() -> OperationCollector {
        OperationCollector::open(4, &[1, 2, 3], 1_000, 500)
    }

    #[test]
    fn completes_when_everyone_answers() {
        let mut c = open();
        for seat in 1..4 {
            assert_eq!(c.poll(1_000), Completion::Pending);
            c.record(seat, Operation::skip()).unwrap();
        }
        assert_eq!(c.poll(1_000), Completion::Complete { timed_out: false });
    }

    #[test]
    fn rejects_ineligible_and_duplicate() {
        let mut c = open();
        assert!(matches!(
            c.record(0, Operation::skip()),
            Err(EngineError::ProtocolViolation { seat: 0, .. })
        ));
        c.record(1, Operation::skip()).unwrap();
        assert!(c.record(1, Operation::discard(4)).is_err());
        assert!(c.responses()[1].as_ref().is_some_and(Operation::is_skip));
    }

    #[test]
    fn deadline_is_strict() {
        let mut c = open();
        assert_eq!(c.poll(1_500), Completion::Pending);
        assert_eq!(c.poll(1_501), Completion::Complete { timed_out: true });
    }

    #[test]
    fn timeout_forces_skip_for_any_number_pending() {
        for answered in 0..3 {
            let mut c = open();
            for seat in 1..=answered {
                c.record(seat, Operation::new(OperationKind::Pon, None, &[])).unwrap();
            }
            assert_eq!(c.poll(2_000), Completion::Complete { timed_out: true });
            let skips = c.responses().iter().flatten().filter(|o| o.is_skip()).count();
            assert_eq!(skips, 3 - answered);
            assert!(c.pending_seats().is_empty());
        }
    }

    #[test]
    fn empty_window_completes_at_once() {
        let mut c = OperationCollector::open(4, &[], 0, 0);
        assert_eq!(c.poll(0), Completion::Complete { timed_out: false });
    }
}
