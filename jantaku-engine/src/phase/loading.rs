use crate::collector::{Collection, Completion, OperationCollector};
use crate::errors::{EngineError, EngineResult};
use crate::message::ServerEvent;
use crate::operation::Operation;
use crate::state::RoundState;
use crate::types::Seat;

use super::{round_of, Phase, PhaseContext, Step};

pub(super) fn enter_wait_for_loading(ctx: &mut PhaseContext<'_>) -> EngineResult<Step> {
    ctx.broadcast(&ServerEvent::LoadingStarted);
    let num_seats = ctx.participants.len();
    let all: Vec<Seat> = (0..num_seats).collect();
    let mut collector = OperationCollector::open(
        num_seats,
        &all,
        ctx.now_ms,
        ctx.settings.wait_for_loading_timeout_ms,
    );
    for participant in ctx.participants.iter_mut() {
        if participant.request_ready() {
            collector.record(participant.seat(), Operation::skip())?;
        }
    }
    Ok(Step::Collect(Collection::new(collector, vec![Vec::new(); num_seats], None)))
}

/// Unlike operation windows, an expired readiness wait is fatal.
pub(super) fn poll_loading(collection: &mut Collection, now_ms: u64) -> EngineResult<Completion> {
    let missing = collection.collector.pending_seats();
    if missing.is_empty() {
        return Ok(Completion::Complete { timed_out: false });
    }
    if collection.collector.is_expired(now_ms) {
        return Err(EngineError::LoadFailure { missing });
    }
    Ok(Completion::Pending)
}

pub(super) fn enter_prepare(ctx: &mut PhaseContext<'_>) -> EngineResult<Step> {
    *ctx.round = Some(RoundState::new(ctx.seats.to_vec(), ctx.settings)?);
    Ok(Step::Next(Phase::RoundStart {
        next: false,
        extra: false,
        keep_sticks: true,
    }))
}

pub(super) fn enter_round_start(
    ctx: &mut PhaseContext<'_>,
    next: bool,
    extra: bool,
    keep_sticks: bool,
) -> EngineResult<Step> {
    let round = round_of(ctx.round)?;
    round.advance(next, extra, keep_sticks);
    let key = round.round_key();
    let tiles = ctx.walls.next_wall(&key);
    round.start_round(tiles, ctx.settings)?;
    log::info!(
        "round {} (extra {}) dealt, dealer seat {}",
        round.round_index,
        round.extra,
        round.dealer
    );

    for (seat, participant) in ctx.participants.iter_mut().enumerate() {
        participant.notify(&ServerEvent::RoundStarted {
            view: round.view_for(seat),
        });
    }
    Ok(Step::Next(Phase::Draw {
        seat: round.dealer,
        replacement: false,
        ling_shang: false,
        turn_dora_after_discard: false,
    }))
}
