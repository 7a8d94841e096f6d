use crate::collector::Collection;
use crate::errors::{EngineError, EngineResult};
use crate::message::{DrawReason, RequestWindow, ServerEvent};
use crate::operation::OperationKind;
use crate::resolver::resolve_in_turn;
use crate::tile::TileName;
use crate::types::Seat;

use super::{round_of, ClaimWindow, Phase, PhaseContext, Step};

pub(super) fn enter_draw(
    ctx: &mut PhaseContext<'_>,
    seat: Seat,
    replacement: bool,
    ling_shang: bool,
    turn_dora_after_discard: bool,
) -> EngineResult<Step> {
    let round = round_of(ctx.round)?;
    if !replacement && round.wall.live_remaining() == 0 {
        return Ok(Step::Next(Phase::RoundDraw {
            reason: DrawReason::Exhausted,
        }));
    }
    let tile = round.draw_tile(seat, replacement)?;
    log::debug!("seat {} draws {:?} (replacement: {})", seat, TileName(tile), replacement);
    Ok(Step::Next(Phase::Discard {
        seat,
        after_claim: false,
        ling_shang,
        turn_dora_after_discard,
    }))
}

pub(super) fn enter_discard(
    ctx: &mut PhaseContext<'_>,
    seat: Seat,
    after_claim: bool,
    ling_shang: bool,
) -> EngineResult<Step> {
    let round = ctx.round()?;
    let operations = round.in_turn_operations(seat, after_claim, ling_shang, ctx.settings, ctx.evaluator);
    let collection = ctx.open_window(RequestWindow::InTurn { after_claim }, vec![(seat, operations)])?;
    Ok(Step::Collect(collection))
}

pub(super) fn complete_discard(
    ctx: &mut PhaseContext<'_>,
    seat: Seat,
    turn_dora_after_discard: bool,
    collection: &Collection,
) -> EngineResult<Phase> {
    let response = collection.collector.responses().get(seat).and_then(Option::as_ref);
    let offered = collection.legal.get(seat).map(Vec::as_slice).unwrap_or(&[]);
    let operation = resolve_in_turn(seat, response, offered, ctx.settings);
    let round = round_of(ctx.round)?;

    let next = match operation.kind {
        OperationKind::Tsumo => {
            let tile = operation
                .tile
                .ok_or_else(|| EngineError::invariant("tsumo without a tile"))?;
            Phase::Tsumo {
                seat,
                tile,
                point: operation.point.unwrap_or_default(),
            }
        }
        OperationKind::Kong => Phase::Kong { seat, operation },
        OperationKind::BeiDora => Phase::BeiDora {
            seat,
            tile: operation
                .tile
                .ok_or_else(|| EngineError::invariant("bei-dora without a tile"))?,
        },
        OperationKind::NineOrphans => Phase::RoundDraw {
            reason: DrawReason::NineOrphans,
        },
        OperationKind::Skip | OperationKind::Discard | OperationKind::Riichi => {
            let tile = match operation.tile {
                Some(t) if !operation.is_skip() => t,
                _ => round
                    .default_discard(seat)
                    .ok_or_else(|| EngineError::invariant(format!("seat {} has nothing to discard", seat)))?,
            };
            let riichi = operation.kind == OperationKind::Riichi;
            let discarded = round.discard(seat, tile, riichi)?;
            if turn_dora_after_discard {
                if let Some(indicator) = round.turn_dora() {
                    log::debug!("dora indicator {:?} turned after discard", TileName(indicator));
                }
            }
            log::debug!("seat {} discards {:?}{}", seat, TileName(tile), if riichi { " (riichi)" } else { "" });
            ctx.broadcast(&ServerEvent::TileDiscarded {
                seat,
                tile,
                tsumogiri: discarded.tsumogiri,
                riichi,
            });
            Phase::OutTurnCollection {
                window: ClaimWindow::Discard { seat, tile },
            }
        }
        OperationKind::Chi | OperationKind::Pon | OperationKind::Rong => {
            return Err(EngineError::invariant(format!(
                "{:?} resolved in an in-turn window",
                operation.kind
            )))
        }
    };
    Ok(next)
}
