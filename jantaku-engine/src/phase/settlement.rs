use crate::errors::EngineResult;
use crate::message::{DrawReason, ServerEvent};
use crate::state::RoundState;
use crate::types::{PointInfo, Seat, Transfer};

use super::{round_of, Phase, PhaseContext, Step};

pub const STICK_VALUE: i32 = 1_000;
/// Repeat-counter bonus on a discard win.
pub const EXTRA_RONG_BONUS: i32 = 300;
/// Repeat-counter bonus paid by each seat on a self-drawn win.
pub const EXTRA_TSUMO_BONUS: i32 = 100;

fn round_up_100(x: i32) -> i32 {
    (x + 99) / 100 * 100
}

fn sticks_transfer(round: &RoundState, to: Seat) -> Option<Transfer> {
    (round.sticks > 0).then(|| Transfer {
        from: None,
        to,
        amount: round.sticks as i32 * STICK_VALUE,
    })
}

/// The discarder pays every winner; the nearest winner also takes the
/// repeat bonus and the sticks.
pub fn rong_transfers(round: &RoundState, discarder: Seat, winners: &[(Seat, PointInfo)]) -> Vec<Transfer> {
    let mut transfers: Vec<Transfer> = winners
        .iter()
        .enumerate()
        .map(|(i, (seat, point))| Transfer {
            from: Some(discarder),
            to: *seat,
            amount: point.points + if i == 0 { round.extra as i32 * EXTRA_RONG_BONUS } else { 0 },
        })
        .collect();
    if let Some((first, _)) = winners.first() {
        transfers.extend(sticks_transfer(round, *first));
    }
    transfers
}

/// Every other seat pays a share of the hand value.
pub fn tsumo_transfers(round: &RoundState, winner: Seat, point: &PointInfo) -> Vec<Transfer> {
    let n = round.num_seats as i32;
    let dealer_won = winner == round.dealer;
    let mut transfers: Vec<Transfer> = (0..round.num_seats)
        .filter(|&seat| seat != winner)
        .map(|seat| {
            let share = if dealer_won {
                point.points / (n - 1)
            } else if seat == round.dealer || n == 3 {
                point.points / 2
            } else {
                point.points / 4
            };
            Transfer {
                from: Some(seat),
                to: winner,
                amount: round_up_100(share) + round.extra as i32 * EXTRA_TSUMO_BONUS,
            }
        })
        .collect();
    transfers.extend(sticks_transfer(round, winner));
    transfers
}

/// Noten seats pay the penalty to tenpai seats, split evenly.
pub fn noten_transfers(num_seats: usize, ready: &[Seat], penalty: i32) -> Vec<Transfer> {
    let tenpai = ready.len();
    if tenpai == 0 || tenpai == num_seats {
        return Vec::new();
    }
    let noten = num_seats - tenpai;
    let amount = penalty / (tenpai * noten) as i32;
    let mut transfers = Vec::with_capacity(tenpai * noten);
    for payer in (0..num_seats).filter(|s| !ready.contains(s)) {
        for &to in ready {
            transfers.push(Transfer {
                from: Some(payer),
                to,
                amount,
            });
        }
    }
    transfers
}

pub(super) fn enter_tsumo(ctx: &mut PhaseContext<'_>, seat: Seat, tile: u8, point: &PointInfo) -> EngineResult<Step> {
    let round = ctx.round()?;
    let transfers = tsumo_transfers(round, seat, point);
    let dealer_won = seat == round.dealer;
    let ura_dora_indicators = round.ura_dora_indicators().to_vec();
    log::info!("seat {} wins by self-draw for {} points", seat, point.points);

    ctx.broadcast(&ServerEvent::Won {
        winners: vec![(seat, point.clone())],
        loser: None,
        tile,
        ura_dora_indicators,
    });
    Ok(Step::Next(Phase::PointTransfer {
        transfers,
        next: !dealer_won,
        extra: dealer_won,
        keep_sticks: false,
    }))
}

pub(super) fn enter_rong(
    ctx: &mut PhaseContext<'_>,
    discarder: Seat,
    tile: u8,
    winners: &[(Seat, PointInfo)],
) -> EngineResult<Step> {
    let round = ctx.round()?;
    let transfers = rong_transfers(round, discarder, winners);
    let dealer_won = winners.iter().any(|(seat, _)| *seat == round.dealer);
    let ura_dora_indicators = round.ura_dora_indicators().to_vec();
    log::info!(
        "seats {:?} win on seat {}'s tile",
        winners.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        discarder
    );

    ctx.broadcast(&ServerEvent::Won {
        winners: winners.to_vec(),
        loser: Some(discarder),
        tile,
        ura_dora_indicators,
    });
    Ok(Step::Next(Phase::PointTransfer {
        transfers,
        next: !dealer_won,
        extra: dealer_won,
        keep_sticks: false,
    }))
}

pub(super) fn enter_round_draw(ctx: &mut PhaseContext<'_>, reason: DrawReason) -> EngineResult<Step> {
    let round = ctx.round()?;
    let (ready, transfers, next) = match reason {
        DrawReason::Exhausted => {
            let ready: Vec<Seat> = (0..round.num_seats)
                .filter(|&seat| round.is_ready(ctx.evaluator, seat))
                .collect();
            let transfers = noten_transfers(round.num_seats, &ready, ctx.settings.noten_penalty);
            let dealer_ready = ready.contains(&round.dealer);
            (ready, transfers, !dealer_ready)
        }
        _ => (Vec::new(), Vec::new(), false),
    };
    log::info!("round drawn ({:?}), ready seats {:?}", reason, ready);

    ctx.broadcast(&ServerEvent::RoundDrawn { reason, ready });
    Ok(Step::Next(Phase::PointTransfer {
        transfers,
        next,
        extra: true,
        keep_sticks: true,
    }))
}

pub(super) fn enter_point_transfer(
    ctx: &mut PhaseContext<'_>,
    transfers: &[Transfer],
    next: bool,
    extra: bool,
    keep_sticks: bool,
) -> EngineResult<Step> {
    let round = round_of(ctx.round)?;
    round.apply_transfers(transfers)?;
    if !keep_sticks {
        round.sticks = 0;
    }
    let scores = round.scores();
    let last_round = next && round.round_index + 1 >= ctx.settings.round_count;
    let bankrupt = ctx.settings.end_on_negative_score && scores.iter().any(|&s| s < 0);

    ctx.broadcast(&ServerEvent::PointsTransferred {
        transfers: transfers.to_vec(),
        scores,
    });
    if last_round || bankrupt {
        return Ok(Step::Next(Phase::GameEnd));
    }
    Ok(Step::Next(Phase::RoundStart {
        next,
        extra,
        keep_sticks,
    }))
}

pub(super) fn enter_game_end(ctx: &mut PhaseContext<'_>) -> EngineResult<Step> {
    let scores = ctx.round()?.scores();
    log::info!("game over, final scores {:?}", scores);
    ctx.broadcast(&ServerEvent::GameEnded { scores });
    Ok(Step::Halt)
}
