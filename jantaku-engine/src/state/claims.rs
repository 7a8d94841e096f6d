//! Legal operation enumeration.

use crate::evaluator::{HandEvaluator, RULE_THIRTEEN_ORPHANS};
use crate::operation::Operation;
use crate::settings::GameSettings;
use crate::tile::{self, is_terminal_or_honor, kind_counts, NORTH};
use crate::types::{HandStatus, MeldKind, Seat};

use super::{RoundState, RIICHI_DEPOSIT};

/// Kongs allowed on the table before further kongs are refused.
pub const MAX_KONGS: usize = 4;

impl RoundState {
    fn tiles_of_kind(&self, seat: Seat, kind: u8) -> Vec<u8> {
        self.hand(seat)
            .iter()
            .copied()
            .filter(|&t| tile::kind(t) == kind)
            .collect()
    }

    fn can_call(&self, seat: Seat) -> bool {
        self.wall.live_remaining() > 0 && self.players.get(seat).is_some_and(|p| !p.riichi)
    }

    /// Pon options on `tile`, one per distinct red-five choice.
    pub fn pon_candidates(&self, seat: Seat, tile: u8) -> Vec<Operation> {
        if !self.can_call(seat) {
            return Vec::new();
        }
        let same = self.tiles_of_kind(seat, tile::kind(tile));
        let mut out: Vec<Operation> = Vec::new();
        for i in 0..same.len() {
            for j in i + 1..same.len() {
                let op = Operation::pon(tile, &[same[i], same[j]]);
                let reds = op.consumed.iter().filter(|&&t| tile::is_aka(t)).count();
                let seen = out
                    .iter()
                    .any(|o| o.consumed.iter().filter(|&&t| tile::is_aka(t)).count() == reds);
                if !seen {
                    out.push(op);
                }
            }
        }
        out
    }

    pub fn open_kong_candidates(&self, seat: Seat, tile: u8) -> Vec<Operation> {
        if !self.can_call(seat) || self.kong_count() >= MAX_KONGS {
            return Vec::new();
        }
        let same = self.tiles_of_kind(seat, tile::kind(tile));
        if same.len() == 3 {
            vec![Operation::kong(tile, &same)]
        } else {
            Vec::new()
        }
    }

    /// Chi is only open to the seat right after the discarder.
    pub fn chi_candidates(&self, seat: Seat, discarder: Seat, tile: u8, settings: &GameSettings) -> Vec<Operation> {
        if !settings.chi_enabled() || seat != self.next_seat(discarder) || !self.can_call(seat) {
            return Vec::new();
        }
        let k = tile::kind(tile);
        let Some(num) = tile::suit_number(k) else {
            return Vec::new();
        };
        let base = k - num;
        // Prefer a plain copy over a red five when both are held.
        let pick = |n: i16| -> Option<u8> {
            if !(0..9).contains(&n) {
                return None;
            }
            self.tiles_of_kind(seat, base + n as u8).last().copied()
        };
        let n = num as i16;
        [(n - 2, n - 1), (n - 1, n + 1), (n + 1, n + 2)]
            .iter()
            .filter_map(|&(a, b)| Some(Operation::chi(tile, &[pick(a)?, pick(b)?])))
            .collect()
    }

    pub fn concealed_kong_candidates(&self, seat: Seat) -> Vec<Operation> {
        if !self.can_call(seat) || self.kong_count() >= MAX_KONGS {
            return Vec::new();
        }
        let tiles = self.concealed_tiles(seat);
        let counts = kind_counts(&tiles);
        counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == 4)
            .map(|(k, _)| {
                let set: Vec<u8> = tiles.iter().copied().filter(|&t| tile::kind(t) as usize == k).collect();
                Operation::kong(set[0], &set)
            })
            .collect()
    }

    pub fn added_kong_candidates(&self, seat: Seat) -> Vec<Operation> {
        if !self.can_call(seat) || self.kong_count() >= MAX_KONGS {
            return Vec::new();
        }
        let tiles = self.concealed_tiles(seat);
        self.open_melds(seat)
            .iter()
            .filter(|m| m.kind == MeldKind::Pon)
            .filter_map(|m| {
                let t = tiles.iter().copied().find(|&t| tile::kind(t) == m.first_kind())?;
                Some(Operation::kong(t, &[t]))
            })
            .collect()
    }

    pub fn bei_dora_candidates(&self, seat: Seat, settings: &GameSettings) -> Vec<Operation> {
        if !settings.bei_dora_enabled() || self.wall.live_remaining() == 0 {
            return Vec::new();
        }
        self.concealed_tiles(seat)
            .into_iter()
            .find(|&t| tile::kind(t) == NORTH)
            .map(|t| vec![Operation::bei_dora(t)])
            .unwrap_or_default()
    }

    /// Riichi discards that leave the hand waiting.
    pub fn riichi_candidates(&self, seat: Seat, evaluator: &dyn HandEvaluator) -> Vec<Operation> {
        let Some(player) = self.players.get(seat) else {
            return Vec::new();
        };
        if player.riichi
            || player.has_open_meld()
            || player.score < RIICHI_DEPOSIT
            || self.wall.live_remaining() < self.num_seats
            || self.last_draw_of(seat).is_none()
        {
            return Vec::new();
        }
        let tiles = self.concealed_tiles(seat);
        let mut out: Vec<Operation> = Vec::new();
        for (i, &t) in tiles.iter().enumerate() {
            if out.iter().any(|o| o.tile.map(tile::kind) == Some(tile::kind(t))) {
                continue;
            }
            let mut rest = tiles.clone();
            rest.remove(i);
            if evaluator.is_ready(&rest, &player.melds) {
                out.push(Operation::riichi(t));
            }
        }
        out
    }

    /// Abortive draw on the first uninterrupted draw with nine distinct
    /// terminal or honor kinds.
    pub fn nine_orphans_available(&self, seat: Seat) -> bool {
        if !self.first_turn || !self.discards(seat).is_empty() || self.last_draw_of(seat).is_none() {
            return false;
        }
        if self.players.iter().any(|p| !p.melds.is_empty()) {
            return false;
        }
        let counts = kind_counts(&self.concealed_tiles(seat));
        counts
            .iter()
            .enumerate()
            .filter(|(k, &c)| c > 0 && is_terminal_or_honor(*k as u8))
            .count()
            >= 9
    }

    pub fn discard_candidates(&self, seat: Seat) -> Vec<Operation> {
        let riichi = self.players.get(seat).is_some_and(|p| p.riichi);
        if riichi {
            return self
                .last_draw_of(seat)
                .map(|t| vec![Operation::discard(t)])
                .unwrap_or_default();
        }
        self.concealed_tiles(seat).into_iter().map(Operation::discard).collect()
    }

    /// The tile an in-turn Skip discards: the draw if held, else the last
    /// hand tile.
    pub fn default_discard(&self, seat: Seat) -> Option<u8> {
        self.last_draw_of(seat).or_else(|| self.hand(seat).last().copied())
    }

    /// Everything the acting seat may do. `Skip` comes first.
    pub fn in_turn_operations(
        &self,
        seat: Seat,
        after_claim: bool,
        ling_shang: bool,
        settings: &GameSettings,
        evaluator: &dyn HandEvaluator,
    ) -> Vec<Operation> {
        let mut ops = vec![Operation::skip()];
        if !after_claim {
            if let Some(t) = self.last_draw_of(seat) {
                let status = HandStatus {
                    tsumo: true,
                    ling_shang,
                    last_tile: self.wall.live_remaining() == 0,
                    ..Default::default()
                };
                let point = self.evaluate_win(evaluator, seat, t, status);
                if settings.check_constraint(&point) {
                    ops.push(Operation::tsumo(t, point));
                }
            }
            ops.extend(self.concealed_kong_candidates(seat));
            ops.extend(self.added_kong_candidates(seat));
            ops.extend(self.bei_dora_candidates(seat, settings));
            ops.extend(self.riichi_candidates(seat, evaluator));
            if self.nine_orphans_available(seat) {
                ops.push(Operation::nine_orphans());
            }
        }
        ops.extend(self.discard_candidates(seat));
        ops
    }

    /// Claims `seat` may make on `discarder`'s discard. Empty when there is
    /// nothing to offer; otherwise `Skip` comes first.
    pub fn discard_claim_operations(
        &self,
        seat: Seat,
        discarder: Seat,
        tile: u8,
        settings: &GameSettings,
        evaluator: &dyn HandEvaluator,
    ) -> Vec<Operation> {
        let mut ops = Vec::new();
        let status = HandStatus {
            last_tile: self.wall.live_remaining() == 0,
            ..Default::default()
        };
        let point = self.evaluate_win(evaluator, seat, tile, status);
        if settings.check_constraint(&point) {
            ops.push(Operation::rong(tile, point));
        }
        ops.extend(self.open_kong_candidates(seat, tile));
        ops.extend(self.pon_candidates(seat, tile));
        ops.extend(self.chi_candidates(seat, discarder, tile, settings));
        if !ops.is_empty() {
            ops.insert(0, Operation::skip());
        }
        ops
    }

    /// Offer to a seat watching a kong. Every seat is asked, so the list is
    /// at least `[Skip]`. A concealed kong is only robbable by thirteen
    /// orphans, and only when the table allows it.
    pub fn rob_kong_operations(
        &self,
        seat: Seat,
        tile: u8,
        concealed: bool,
        settings: &GameSettings,
        evaluator: &dyn HandEvaluator,
    ) -> Vec<Operation> {
        let mut ops = vec![Operation::skip()];
        if concealed && !settings.allow_rob_concealed_kong_with_thirteen_orphans {
            return ops;
        }
        let status = HandStatus {
            rob_kong: true,
            ..Default::default()
        };
        let point = self.evaluate_win(evaluator, seat, tile, status);
        if settings.check_constraint(&point) && (!concealed || point.has_rule(RULE_THIRTEEN_ORPHANS)) {
            ops.push(Operation::rong(tile, point));
        }
        ops
    }

    pub fn rob_bei_dora_operations(
        &self,
        seat: Seat,
        tile: u8,
        settings: &GameSettings,
        evaluator: &dyn HandEvaluator,
    ) -> Vec<Operation> {
        let status = HandStatus {
            rob_kong: settings.allow_bei_dora_rong_as_rob_kong,
            ..Default::default()
        };
        let point = self.evaluate_win(evaluator, seat, tile, status);
        let mut ops = vec![Operation::skip()];
        if settings.check_constraint(&point) {
            ops.push(Operation::rong(tile, point));
        }
        ops
    }
}
