use crate::errors::{EngineError, EngineResult};
use crate::message::ServerEvent;
use crate::operation::Operation;
use crate::tile::TileName;
use crate::types::{Meld, MeldKind, Seat};

use super::{round_of, ClaimWindow, Phase, PhaseContext, Step};

/// Applies a concealed kong (four consumed tiles) or an added kong (one).
pub(super) fn enter_kong(ctx: &mut PhaseContext<'_>, seat: Seat, operation: &Operation) -> EngineResult<Step> {
    let round = round_of(ctx.round)?;
    round.merge_last_draw(seat)?;

    let concealed = operation.consumed.len() == 4;
    let (meld, tile) = if concealed {
        for &t in &operation.consumed {
            round.remove_tile(seat, t)?;
        }
        let meld = Meld::new(MeldKind::ConcealedKong, operation.consumed.clone(), None, None);
        round.add_meld(seat, meld.clone())?;
        if let Some(indicator) = round.turn_dora() {
            log::debug!("dora indicator {:?} turned by concealed kong", TileName(indicator));
        }
        let tile = operation.tile.unwrap_or(operation.consumed[0]);
        (meld, tile)
    } else {
        let tile = operation
            .tile
            .ok_or_else(|| EngineError::invariant("added kong without a tile"))?;
        round.remove_tile(seat, tile)?;
        (round.add_kong(seat, tile)?, tile)
    };
    log::debug!("seat {} declares {}", seat, operation);

    let dora_indicators = round.dora_indicators().to_vec();
    ctx.broadcast(&ServerEvent::KongDeclared {
        seat,
        meld,
        dora_indicators,
    });
    Ok(Step::Next(Phase::OutTurnCollection {
        window: ClaimWindow::RobKong { seat, tile, concealed },
    }))
}

pub(super) fn enter_bei_dora(ctx: &mut PhaseContext<'_>, seat: Seat, tile: u8) -> EngineResult<Step> {
    round_of(ctx.round)?.add_bei_dora(seat, tile)?;
    log::debug!("seat {} sets aside {:?} as bei-dora", seat, TileName(tile));
    ctx.broadcast(&ServerEvent::BeiDoraDeclared { seat, tile });
    Ok(Step::Next(Phase::OutTurnCollection {
        window: ClaimWindow::RobBeiDora { seat, tile },
    }))
}
