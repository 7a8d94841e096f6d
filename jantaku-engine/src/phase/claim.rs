use serde::{Deserialize, Serialize};

use crate::collector::Collection;
use crate::errors::{EngineError, EngineResult};
use crate::message::{DrawReason, RequestWindow, ServerEvent};
use crate::operation::{Operation, OperationKind};
use crate::resolver::{resolve_claims, Resolution};
use crate::state::RoundState;
use crate::tile::{self, is_wind};
use crate::types::{Meld, MeldKind, Seat};

use super::{round_of, Phase, PhaseContext, Step};

/// The tile other seats may react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClaimWindow {
    Discard { seat: Seat, tile: u8 },
    RobKong { seat: Seat, tile: u8, concealed: bool },
    RobBeiDora { seat: Seat, tile: u8 },
}

impl ClaimWindow {
    pub fn actor(&self) -> Seat {
        match self {
            ClaimWindow::Discard { seat, .. }
            | ClaimWindow::RobKong { seat, .. }
            | ClaimWindow::RobBeiDora { seat, .. } => *seat,
        }
    }

    pub fn tile(&self) -> u8 {
        match self {
            ClaimWindow::Discard { tile, .. }
            | ClaimWindow::RobKong { tile, .. }
            | ClaimWindow::RobBeiDora { tile, .. } => *tile,
        }
    }

    fn request_window(&self) -> RequestWindow {
        match *self {
            ClaimWindow::Discard { seat, tile } => RequestWindow::Discard { discarder: seat, tile },
            ClaimWindow::RobKong { seat, tile, .. } => RequestWindow::RobKong { seat, tile },
            ClaimWindow::RobBeiDora { seat, tile } => RequestWindow::RobBeiDora { seat, tile },
        }
    }
}

pub(super) fn enter_out_turn(ctx: &mut PhaseContext<'_>, window: &ClaimWindow) -> EngineResult<Step> {
    let round = ctx.round()?;
    let actor = window.actor();
    let offers: Vec<(Seat, Vec<Operation>)> = (0..round.num_seats)
        .filter(|&seat| seat != actor)
        .map(|seat| {
            let ops = match *window {
                ClaimWindow::Discard { seat: discarder, tile } => {
                    round.discard_claim_operations(seat, discarder, tile, ctx.settings, ctx.evaluator)
                }
                ClaimWindow::RobKong { tile, concealed, .. } => {
                    round.rob_kong_operations(seat, tile, concealed, ctx.settings, ctx.evaluator)
                }
                ClaimWindow::RobBeiDora { tile, .. } => {
                    round.rob_bei_dora_operations(seat, tile, ctx.settings, ctx.evaluator)
                }
            };
            (seat, ops)
        })
        // Rob windows always offer Skip; a discard only reaches seats with a claim.
        .filter(|(_, ops)| !ops.is_empty())
        .collect();
    let collection = ctx.open_window(window.request_window(), offers)?;
    Ok(Step::Collect(collection))
}

pub(super) fn complete_out_turn(
    ctx: &mut PhaseContext<'_>,
    window: &ClaimWindow,
    collection: &Collection,
) -> EngineResult<Phase> {
    let actor = window.actor();
    let num_seats = ctx.round()?.num_seats;
    let resolution = resolve_claims(
        actor,
        num_seats,
        collection.collector.responses(),
        &collection.legal,
        ctx.settings,
    );
    log::debug!("window {:?} resolved to {:?}", window, resolution);

    match resolution {
        Resolution::Rong { winners } => Ok(Phase::Rong {
            discarder: actor,
            tile: window.tile(),
            winners: winners
                .into_iter()
                .map(|(seat, op)| (seat, op.point.unwrap_or_default()))
                .collect(),
            rob_kong: match window {
                ClaimWindow::Discard { .. } => false,
                ClaimWindow::RobKong { .. } => true,
                ClaimWindow::RobBeiDora { .. } => ctx.settings.allow_bei_dora_rong_as_rob_kong,
            },
        }),
        Resolution::TripleRong => Ok(Phase::RoundDraw {
            reason: DrawReason::ThreeRong,
        }),
        Resolution::Claim { seat, operation } => match window {
            ClaimWindow::Discard { .. } => {
                accept_pending_riichi(ctx)?;
                Ok(Phase::OperationPerform {
                    seat,
                    discarder: actor,
                    operation,
                })
            }
            _ => Err(EngineError::invariant(format!(
                "meld claim {} resolved in a rob window",
                operation
            ))),
        },
        Resolution::AllSkip => match *window {
            ClaimWindow::Discard { seat, .. } => {
                accept_pending_riichi(ctx)?;
                let round = ctx.round()?;
                if let Some(reason) = abortive_draw(round) {
                    return Ok(Phase::RoundDraw { reason });
                }
                Ok(Phase::Draw {
                    seat: round.next_seat(seat),
                    replacement: false,
                    ling_shang: false,
                    turn_dora_after_discard: false,
                })
            }
            ClaimWindow::RobKong { seat, concealed, .. } => {
                round_of(ctx.round)?.break_one_shots_and_first_turn();
                Ok(Phase::Draw {
                    seat,
                    replacement: true,
                    ling_shang: true,
                    turn_dora_after_discard: !concealed,
                })
            }
            ClaimWindow::RobBeiDora { seat, .. } => {
                round_of(ctx.round)?.break_one_shots_and_first_turn();
                Ok(Phase::Draw {
                    seat,
                    replacement: true,
                    ling_shang: ctx.settings.allow_bei_dora_tsumo_as_ling_shang,
                    turn_dora_after_discard: false,
                })
            }
        },
    }
}

fn accept_pending_riichi(ctx: &mut PhaseContext<'_>) -> EngineResult<()> {
    if let Some(seat) = round_of(ctx.round)?.accept_riichi() {
        log::debug!("seat {} riichi accepted", seat);
        ctx.broadcast(&ServerEvent::RiichiAccepted { seat });
    }
    Ok(())
}

/// Abortive draws checked once a discard has passed unclaimed.
pub(crate) fn abortive_draw(round: &RoundState) -> Option<DrawReason> {
    let players = &round.players;
    if round.num_seats == 4 {
        let first_go_around = players
            .iter()
            .all(|p| p.discards.len() == 1 && p.melds.is_empty());
        if first_go_around {
            let first = players[0].discards.first().map(|d| tile::kind(d.tile));
            if let Some(kind) = first.filter(|&k| is_wind(k)) {
                let same = players
                    .iter()
                    .all(|p| p.discards.first().map(|d| tile::kind(d.tile)) == Some(kind));
                if same {
                    return Some(DrawReason::FourWinds);
                }
            }
        }

        if players.iter().all(|p| p.riichi) {
            return Some(DrawReason::FourRiichi);
        }
    }

    let owners: Vec<usize> = players
        .iter()
        .enumerate()
        .flat_map(|(seat, p)| p.melds.iter().filter(|m| m.is_kong()).map(move |_| seat))
        .collect();
    if owners.len() >= 4 && owners.iter().any(|&o| o != owners[0]) {
        return Some(DrawReason::FourKongs);
    }
    None
}

pub(super) fn enter_operation_perform(
    ctx: &mut PhaseContext<'_>,
    seat: Seat,
    discarder: Seat,
    operation: &Operation,
) -> EngineResult<Step> {
    let round = round_of(ctx.round)?;
    let (from, tile) = round.claim_last_discard()?;
    if from != discarder {
        return Err(EngineError::invariant(format!(
            "claim on seat {}'s discard but the last discard was seat {}'s",
            discarder, from
        )));
    }
    let kind = match operation.kind {
        OperationKind::Chi => MeldKind::Chi,
        OperationKind::Pon => MeldKind::Pon,
        OperationKind::Kong => MeldKind::OpenKong,
        other => {
            return Err(EngineError::invariant(format!("{:?} is not a meld claim", other)));
        }
    };
    for &t in &operation.consumed {
        round.remove_tile(seat, t)?;
    }
    let mut tiles = operation.consumed.clone();
    tiles.push(tile);
    let meld = Meld::new(kind, tiles, Some(tile), Some(discarder));
    round.add_meld(seat, meld.clone())?;
    round.break_one_shots_and_first_turn();
    round.current_seat = seat;
    log::debug!("seat {} claims {} from seat {}", seat, operation, discarder);

    ctx.broadcast(&ServerEvent::MeldClaimed {
        seat,
        from: discarder,
        meld,
    });
    Ok(Step::Next(if kind == MeldKind::OpenKong {
        Phase::Draw {
            seat,
            replacement: true,
            ling_shang: true,
            turn_dora_after_discard: true,
        }
    } else {
        Phase::Discard {
            seat,
            after_claim: true,
            ling_shang: false,
            turn_dora_after_discard: false,
        }
    }))
}
