//! Hand evaluation collaborator.
//!
//! The engine never scores hands itself: every win offer and every tenpai
//! check goes through a [`HandEvaluator`]. [`StandardEvaluator`] is a
//! shape-only stand-in with flat values for bot tables and tests.

use crate::agari;
use crate::tile::{self, kind_counts};
use crate::types::{HandStatus, Meld, PointInfo, Seat, Wind};

pub const RULE_THIRTEEN_ORPHANS: &str = "thirteen_orphans";
pub const RULE_SEVEN_PAIRS: &str = "seven_pairs";
pub const RULE_RIICHI: &str = "riichi";
pub const RULE_ONE_SHOT: &str = "one_shot";
pub const RULE_SELF_DRAW: &str = "self_draw";
pub const RULE_ROB_KONG: &str = "rob_kong";
pub const RULE_LING_SHANG: &str = "ling_shang";
pub const RULE_LAST_TILE: &str = "last_tile";
pub const RULE_ALL_SIMPLES: &str = "all_simples";
pub const RULE_VALUE_HONOR: &str = "value_honor";
pub const RULE_DORA: &str = "dora";

/// Everything the evaluator may look at for one candidate win.
#[derive(Debug, Clone)]
pub struct EvaluationRequest<'a> {
    pub seat: Seat,
    /// Concealed tiles, not including `tile`.
    pub hand: &'a [u8],
    pub melds: &'a [Meld],
    /// The winning tile.
    pub tile: u8,
    pub status: HandStatus,
    /// Kinds that are dora (already converted from the indicators).
    pub dora_kinds: &'a [u8],
    pub ura_dora_kinds: &'a [u8],
    pub bei_dora_count: usize,
    /// Kinds the seat has discarded this round.
    pub discarded_kinds: &'a [u8],
    pub seat_wind: Wind,
    pub round_wind: Wind,
}

pub trait HandEvaluator: Send + Sync {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> PointInfo;

    /// Whether the 13-tile hand (plus melds) waits on at least one kind.
    fn is_ready(&self, hand: &[u8], melds: &[Meld]) -> bool;
}

/// Shape-based evaluator with a flat value per satisfied rule.
#[derive(Debug, Clone)]
pub struct StandardEvaluator {
    pub points_per_rule: i32,
    pub limit_points: i32,
}

impl Default for StandardEvaluator {
    fn default() -> Self {
        Self {
            points_per_rule: 1_000,
            limit_points: 12_000,
        }
    }
}

impl HandEvaluator for StandardEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> PointInfo {
        let mut counts = kind_counts(request.hand);
        let open_sets = request.melds.len();
        let winning_kind = tile::kind(request.tile);
        let waits = agari::waits(&counts, open_sets);
        counts[winning_kind as usize] += 1;

        if !agari::is_agari(&counts, open_sets) {
            return PointInfo::default();
        }

        let closed = request.melds.iter().all(|m| !m.is_open());
        let mut rules: Vec<&str> = Vec::new();

        if closed && open_sets == 0 && agari::is_thirteen_orphans(&counts) {
            return PointInfo {
                points: self.limit_points.max(32_000),
                satisfied_rules: vec![RULE_THIRTEEN_ORPHANS.to_string()],
                meets_minimum: !(is_furiten(request, &waits)),
            };
        }
        if closed && open_sets == 0 && agari::is_seven_pairs(&counts) {
            rules.push(RULE_SEVEN_PAIRS);
        }
        if request.status.riichi {
            rules.push(RULE_RIICHI);
        }
        if request.status.one_shot {
            rules.push(RULE_ONE_SHOT);
        }
        if request.status.tsumo && closed {
            rules.push(RULE_SELF_DRAW);
        }
        if request.status.rob_kong {
            rules.push(RULE_ROB_KONG);
        }
        if request.status.ling_shang {
            rules.push(RULE_LING_SHANG);
        }
        if request.status.last_tile {
            rules.push(RULE_LAST_TILE);
        }
        if all_simples(&counts, request.melds) {
            rules.push(RULE_ALL_SIMPLES);
        }
        let honors = value_honor_sets(&counts, request);
        rules.extend(std::iter::repeat(RULE_VALUE_HONOR).take(honors));

        let meets_minimum = !rules.is_empty() && !is_furiten(request, &waits);
        let dora = dora_count(&counts, request);
        let mut satisfied_rules: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        satisfied_rules.extend(std::iter::repeat(RULE_DORA.to_string()).take(dora));

        let value = self.points_per_rule * satisfied_rules.len() as i32;
        PointInfo {
            points: value.min(self.limit_points),
            satisfied_rules,
            meets_minimum,
        }
    }

    fn is_ready(&self, hand: &[u8], melds: &[Meld]) -> bool {
        !agari::waits(&kind_counts(hand), melds.len()).is_empty()
    }
}

/// Discard wins are refused while the seat has discarded one of its waits.
fn is_furiten(request: &EvaluationRequest<'_>, waits: &[u8]) -> bool {
    !request.status.tsumo && waits.iter().any(|w| request.discarded_kinds.contains(w))
}

fn all_simples(counts: &agari::Counts, melds: &[Meld]) -> bool {
    let concealed = counts
        .iter()
        .enumerate()
        .all(|(k, &c)| c == 0 || !tile::is_terminal_or_honor(k as u8));
    concealed
        && melds
            .iter()
            .flat_map(|m| m.tiles.iter())
            .all(|&t| !tile::is_terminal_or_honor(tile::kind(t)))
}

fn value_honor_sets(counts: &agari::Counts, request: &EvaluationRequest<'_>) -> usize {
    let mut value_kinds = vec![tile::HAKU, tile::HATSU, tile::CHUN];
    value_kinds.push(request.seat_wind.tile_kind());
    value_kinds.push(request.round_wind.tile_kind());
    value_kinds
        .iter()
        .filter(|&&k| {
            counts[k as usize] >= 3 || request.melds.iter().any(|m| m.first_kind() == k)
        })
        .count()
}

fn dora_count(counts: &agari::Counts, request: &EvaluationRequest<'_>) -> usize {
    let mut n = request.bei_dora_count;
    let meld_tiles = request.melds.iter().flat_map(|m| m.tiles.iter().copied());
    let mut all_kinds: Vec<u8> = meld_tiles.map(tile::kind).collect();
    for (k, &c) in counts.iter().enumerate() {
        all_kinds.extend(std::iter::repeat(k as u8).take(c as usize));
    }
    for k in &all_kinds {
        n += request.dora_kinds.iter().filter(|&&d| d == *k).count();
        if request.status.riichi {
            n += request.ura_dora_kinds.iter().filter(|&&d| d == *k).count();
        }
    }
    n += request.hand.iter().filter(|&&t| tile::is_aka(t)).count();
    if tile::is_aka(request.tile) {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles_of(kinds: &[u8]) -> Vec<u8> {
        // Use copy 1 so no red fives sneak in.
        kinds.iter().map(|&k| k * 4 + 1).collect()
    }

    fn request<'a>(hand: &'a [u8], tile: u8, status: HandStatus, discarded: &'a [u8]) -> EvaluationRequest<'a> {
        EvaluationRequest {
            seat: 1,
            hand,
            melds: &[],
            tile,
            status,
            dora_kinds: &[],
            ura_dora_kinds: &[],
            bei_dora_count: 0,
            discarded_kinds: discarded,
            seat_wind: Wind::South,
            round_wind: Wind::East,
        }
    }

    #[test]
    fn riichi_win_meets_minimum() {
        // 234m 345p 456s 678s 55p, waiting 5p
        let hand = tiles_of(&[1, 2, 3, 11, 12, 13, 21, 22, 23, 23, 24, 25, 13]);
        let status = HandStatus {
            riichi: true,
            ..Default::default()
        };
        let point = StandardEvaluator::default().evaluate(&request(&hand, 13 * 4 + 2, status, &[]));
        assert!(point.meets_minimum);
        assert!(point.has_rule(RULE_RIICHI));
        assert!(point.has_rule(RULE_ALL_SIMPLES));
        assert!(point.points >= 2_000);
    }

    #[test]
    fn shape_without_rules_fails_minimum() {
        // 123m 789m 123p 789p 11s on an open-looking discard: no rule applies
        let hand = tiles_of(&[0, 1, 2, 6, 7, 8, 9, 10, 11, 15, 16, 17, 18]);
        let point = StandardEvaluator::default().evaluate(&request(&hand, 18 * 4 + 2, HandStatus::default(), &[]));
        assert!(!point.meets_minimum);
    }

    #[test]
    fn furiten_blocks_discard_win() {
        let hand = tiles_of(&[1, 2, 3, 11, 12, 13, 21, 22, 23, 23, 24, 25, 13]);
        let status = HandStatus {
            riichi: true,
            ..Default::default()
        };
        let discarded = [13u8];
        let point = StandardEvaluator::default().evaluate(&request(&hand, 13 * 4 + 2, status, &discarded));
        assert!(!point.meets_minimum);
    }

    #[test]
    fn thirteen_orphans_is_reported() {
        let hand = tiles_of(&[0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33]);
        let point = StandardEvaluator::default().evaluate(&request(&hand, 2, HandStatus::default(), &[]));
        assert!(point.meets_minimum);
        assert!(point.has_rule(RULE_THIRTEEN_ORPHANS));
    }

    #[test]
    fn readiness() {
        let ready = tiles_of(&[1, 2, 3, 11, 12, 13, 21, 22, 23, 23, 24, 25, 13]);
        assert!(StandardEvaluator::default().is_ready(&ready, &[]));
        let scattered = tiles_of(&[0, 4, 8, 12, 16, 20, 24, 27, 28, 29, 30, 31, 32]);
        assert!(!StandardEvaluator::default().is_ready(&scattered, &[]));
    }

    #[test]
    fn non_winning_shape_is_default() {
        let hand = tiles_of(&[0, 4, 8, 12, 16, 20, 24, 27, 28, 29, 30, 31, 32]);
        let point = StandardEvaluator::default().evaluate(&request(&hand, 33 * 4, HandStatus::default(), &[]));
        assert_eq!(point, PointInfo::default());
    }
}
