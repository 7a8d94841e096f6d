//! Picks the single outcome of a completed collection window.

use crate::errors::{EngineError, EngineResult};
use crate::operation::{Operation, OperationKind};
use crate::settings::GameSettings;
use crate::types::{seat_distance, Seat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    AllSkip,
    /// Every legal win on the tile, nearest seat to the actor first.
    Rong { winners: Vec<(Seat, Operation)> },
    /// The winning meld claim.
    Claim { seat: Seat, operation: Operation },
    /// Three seats won on the same tile and the table treats that as a draw.
    TripleRong,
}

/// Swaps a submitted answer for the offered operation it selects.
///
/// `Ok(None)` is a Skip. Answers matching nothing that was offered, and wins
/// the table does not accept, are `IllegalClaim`.
fn legalize(
    seat: Seat,
    response: &Operation,
    offered: &[Operation],
    settings: &GameSettings,
) -> EngineResult<Option<Operation>> {
    if response.is_skip() {
        return Ok(None);
    }
    let op = offered
        .iter()
        .find(|o| response.selects(o))
        .ok_or_else(|| EngineError::IllegalClaim {
            seat,
            message: format!("{} was not offered", response),
        })?;
    if op.kind.is_win() && !op.point.as_ref().is_some_and(|p| settings.check_constraint(p)) {
        return Err(EngineError::IllegalClaim {
            seat,
            message: format!("{} is below the minimum hand value", op),
        });
    }
    Ok(Some(op.clone()))
}

/// Illegal claims are downgraded to Skip.
fn legal_or_skip(seat: Seat, response: &Operation, offered: &[Operation], settings: &GameSettings) -> Option<Operation> {
    legalize(seat, response, offered, settings).unwrap_or_else(|e| {
        log::warn!("{}; treating as skip", e);
        None
    })
}

/// Resolves an out-of-turn window on `actor`'s tile.
///
/// `responses` and `legal` are indexed by seat.
pub fn resolve_claims(
    actor: Seat,
    num_seats: usize,
    responses: &[Option<Operation>],
    legal: &[Vec<Operation>],
    settings: &GameSettings,
) -> Resolution {
    let mut claims: Vec<(Seat, Operation)> = responses
        .iter()
        .enumerate()
        .filter(|&(seat, _)| seat != actor)
        .filter_map(|(seat, r)| {
            let offered = legal.get(seat).map(Vec::as_slice).unwrap_or(&[]);
            legal_or_skip(seat, r.as_ref()?, offered, settings).map(|op| (seat, op))
        })
        .collect();
    claims.sort_by_key(|(seat, _)| seat_distance(actor, *seat, num_seats));

    let winners: Vec<(Seat, Operation)> = claims
        .iter()
        .filter(|(_, op)| op.kind == OperationKind::Rong)
        .cloned()
        .collect();
    if !winners.is_empty() {
        if settings.triple_rong_is_draw && winners.len() >= 3 {
            return Resolution::TripleRong;
        }
        return Resolution::Rong { winners };
    }

    // Sorted by distance, so the first of the highest rank is the nearest.
    let best = claims
        .into_iter()
        .filter(|(_, op)| op.kind.claim_rank() > 0)
        .fold(None::<(Seat, Operation)>, |best, claim| match best {
            Some(b) if b.1.kind.claim_rank() >= claim.1.kind.claim_rank() => Some(b),
            _ => Some(claim),
        });
    match best {
        Some((seat, operation)) => Resolution::Claim { seat, operation },
        None => Resolution::AllSkip,
    }
}

/// Resolves the acting seat's own decision. Anything not offered becomes
/// Skip.
pub fn resolve_in_turn(
    seat: Seat,
    response: Option<&Operation>,
    legal: &[Operation],
    settings: &GameSettings,
) -> Operation {
    response
        .and_then(|r| legal_or_skip(seat, r, legal, settings))
        .unwrap_or_else(Operation::skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointInfo;

    fn winning_point() -> PointInfo {
        PointInfo {
            points: 2_000,
            satisfied_rules: vec!["riichi".to_string()],
            meets_minimum: true,
        }
    }

    fn table(entries: &[(Seat, Operation)]) -> (Vec<Option<Operation>>, Vec<Vec<Operation>>) {
        let mut responses = vec![None; 4];
        let mut legal = vec![Vec::new(); 4];
        for (seat, op) in entries {
            responses[*seat] = Some(op.clone());
            legal[*seat] = vec![Operation::skip(), op.clone()];
        }
        (responses, legal)
    }

    #[test]
    fn multi_ron_returns_every_winner() {
        let settings = GameSettings::four_player();
        let (responses, legal) = table(&[
            (3, Operation::rong(40, winning_point())),
            (1, Operation::rong(40, winning_point())),
        ]);
        match resolve_claims(0, 4, &responses, &legal, &settings) {
            Resolution::Rong { winners } => {
                let seats: Vec<Seat> = winners.iter().map(|(s, _)| *s).collect();
                assert_eq!(seats, vec![1, 3]);
            }
            other => panic!("expected rong, got {:?}", other),
        }
    }

    #[test]
    fn triple_rong_is_a_draw_when_configured() {
        let settings = GameSettings::four_player();
        let ron = Operation::rong(40, winning_point());
        let (responses, legal) = table(&[(1, ron.clone()), (2, ron.clone()), (3, ron)]);
        assert_eq!(resolve_claims(0, 4, &responses, &legal, &settings), Resolution::TripleRong);

        let lenient = GameSettings {
            triple_rong_is_draw: false,
            ..settings
        };
        assert!(matches!(
            resolve_claims(0, 4, &responses, &legal, &lenient),
            Resolution::Rong { winners } if winners.len() == 3
        ));
    }

    #[test]
    fn rong_beats_pon() {
        let settings = GameSettings::four_player();
        let (responses, legal) = table(&[
            (1, Operation::pon(40, &[41, 42])),
            (2, Operation::rong(40, winning_point())),
        ]);
        assert!(matches!(
            resolve_claims(0, 4, &responses, &legal, &settings),
            Resolution::Rong { .. }
        ));
    }

    #[test]
    fn meld_tie_break_by_seat_distance() {
        let settings = GameSettings::four_player();
        // Discarder is seat 2: seat 3 is nearer than seat 0.
        let (responses, legal) = table(&[
            (0, Operation::kong(40, &[41, 42, 43])),
            (3, Operation::pon(40, &[44, 45])),
        ]);
        match resolve_claims(2, 4, &responses, &legal, &settings) {
            Resolution::Claim { seat, .. } => assert_eq!(seat, 3),
            other => panic!("expected claim, got {:?}", other),
        }
    }

    #[test]
    fn pon_beats_nearer_chi() {
        let settings = GameSettings::four_player();
        let (responses, legal) = table(&[
            (1, Operation::chi(40, &[44, 48])),
            (3, Operation::pon(40, &[41, 42])),
        ]);
        match resolve_claims(0, 4, &responses, &legal, &settings) {
            Resolution::Claim { seat, operation } => {
                assert_eq!(seat, 3);
                assert_eq!(operation.kind, OperationKind::Pon);
            }
            other => panic!("expected claim, got {:?}", other),
        }
    }

    #[test]
    fn illegal_and_low_value_claims_become_skip() {
        let settings = GameSettings::four_player();
        let cheap = PointInfo {
            points: 500,
            satisfied_rules: vec![],
            meets_minimum: false,
        };
        let (mut responses, legal) = table(&[(1, Operation::rong(40, cheap))]);
        // Seat 2 claims something it was never offered.
        responses[2] = Some(Operation::pon(40, &[41, 42]));
        assert_eq!(resolve_claims(0, 4, &responses, &legal, &settings), Resolution::AllSkip);
    }

    #[test]
    fn unoffered_and_cheap_wins_are_illegal_claims() {
        let settings = GameSettings::four_player();
        let offered = vec![Operation::skip(), Operation::pon(40, &[41, 42])];
        assert_eq!(legalize(1, &Operation::skip(), &offered, &settings), Ok(None));
        assert!(matches!(
            legalize(1, &Operation::chi(40, &[44, 48]), &offered, &settings),
            Err(EngineError::IllegalClaim { seat: 1, .. })
        ));

        let cheap = PointInfo {
            points: 500,
            satisfied_rules: vec![],
            meets_minimum: false,
        };
        let offered = vec![Operation::skip(), Operation::rong(40, cheap)];
        let err = legalize(2, &Operation::new(OperationKind::Rong, Some(40), &[]), &offered, &settings);
        assert!(matches!(err, Err(EngineError::IllegalClaim { seat: 2, .. })));
        assert!(!err.unwrap_err().is_fatal());
    }

    #[test]
    fn client_supplied_points_are_ignored() {
        let settings = GameSettings::four_player();
        let (mut responses, legal) = table(&[(1, Operation::rong(40, winning_point()))]);
        responses[1] = Some(Operation::new(OperationKind::Rong, Some(40), &[]));
        match resolve_claims(0, 4, &responses, &legal, &settings) {
            Resolution::Rong { winners } => assert_eq!(winners[0].1.point, Some(winning_point())),
            other => panic!("expected rong, got {:?}", other),
        }
    }

    #[test]
    fn in_turn_falls_back_to_skip() {
        let settings = GameSettings::four_player();
        let legal = vec![Operation::skip(), Operation::discard(8)];
        assert_eq!(
            resolve_in_turn(0, Some(&Operation::discard(8)), &legal, &settings),
            Operation::discard(8)
        );
        assert!(resolve_in_turn(0, Some(&Operation::discard(9)), &legal, &settings).is_skip());
        assert!(resolve_in_turn(0, None, &legal, &settings).is_skip());
    }
}
