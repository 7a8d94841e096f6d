use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{tile_count, tile_set};
use crate::types::Seat;

/// Tiles set aside at the end of the wall: 5 ura indicators, 5 dora
/// indicators and 4 replacement tiles.
pub const DEAD_WALL_SIZE: usize = 14;
pub const MAX_DORA_INDICATORS: usize = 5;
pub const REPLACEMENT_POOL: usize = 4;

/// Identifies one deal so a wall source can reproduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundKey {
    /// Number of deals already made in this game.
    pub hand_index: u64,
    pub round_index: u32,
    pub extra: u32,
}

/// Supplies the tile order for each new round.
///
/// The returned vector must be a permutation of the table's tile set. The
/// first `len - 14` tiles are the live wall in draw order; the last 14 form
/// the dead wall.
pub trait WallSource: Send {
    fn next_wall(&mut self, key: &RoundKey) -> Vec<u8>;
}

/// Plays back preset walls in order, repeating the last one.
#[derive(Debug, Clone, Default)]
pub struct FixedWallSource {
    walls: Vec<Vec<u8>>,
    next: usize,
}

impl FixedWallSource {
    pub fn new(walls: Vec<Vec<u8>>) -> Self {
        Self { walls, next: 0 }
    }

    /// Unshuffled tile set, useful when the deal itself does not matter.
    pub fn ordered(num_seats: usize) -> Self {
        Self::new(vec![tile_set(num_seats)])
    }
}

impl WallSource for FixedWallSource {
    fn next_wall(&mut self, _key: &RoundKey) -> Vec<u8> {
        let idx = self.next.min(self.walls.len().saturating_sub(1));
        self.next += 1;
        self.walls.get(idx).cloned().unwrap_or_default()
    }
}

/// Live wall, dead wall and dora state of one round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallState {
    /// Undrawn live tiles, reversed so that `pop()` draws the next tile.
    pub live: Vec<u8>,
    /// Replacement tiles, reversed like `live`.
    pub replacement: Vec<u8>,
    pub dora_indicator_tiles: Vec<u8>,
    pub ura_indicator_tiles: Vec<u8>,
    /// Number of dora indicators face up (1-5).
    pub revealed: usize,
    pub replacement_draws: usize,
}

impl WallState {
    pub fn from_tiles(tiles: Vec<u8>, num_seats: usize) -> EngineResult<Self> {
        let mut sorted = tiles.clone();
        sorted.sort_unstable();
        if sorted != tile_set(num_seats) {
            return Err(EngineError::invariant(format!(
                "wall of {} tiles is not a permutation of the {}-seat tile set",
                tiles.len(),
                num_seats
            )));
        }

        let n = tiles.len();
        let dead = &tiles[n - DEAD_WALL_SIZE..];
        let mut live = tiles[..n - DEAD_WALL_SIZE].to_vec();
        live.reverse();

        Ok(Self {
            live,
            ura_indicator_tiles: dead[..MAX_DORA_INDICATORS].to_vec(),
            dora_indicator_tiles: dead[MAX_DORA_INDICATORS..2 * MAX_DORA_INDICATORS].to_vec(),
            // Last tile of the wall is drawn first.
            replacement: dead[2 * MAX_DORA_INDICATORS..].to_vec(),
            revealed: 1,
            replacement_draws: 0,
        })
    }

    /// Deals 13 tiles to every seat in blocks of four, dealer first.
    pub fn deal(&mut self, num_seats: usize, dealer: Seat) -> EngineResult<Vec<Vec<u8>>> {
        let mut hands = vec![Vec::with_capacity(14); num_seats];
        for offset in deal_order(num_seats) {
            let seat = (dealer + offset) % num_seats;
            let t = self
                .live
                .pop()
                .ok_or_else(|| EngineError::invariant("live wall ran out while dealing"))?;
            hands[seat].push(t);
        }
        for hand in hands.iter_mut() {
            hand.sort_unstable();
        }
        Ok(hands)
    }

    pub fn draw(&mut self) -> Option<u8> {
        self.live.pop()
    }

    /// Draws from the replacement pool and refills it from the far end of
    /// the live wall.
    pub fn draw_replacement(&mut self) -> Option<u8> {
        let t = self.replacement.pop()?;
        self.replacement_draws += 1;
        if !self.live.is_empty() {
            let refill = self.live.remove(0);
            self.replacement.insert(0, refill);
        }
        Some(t)
    }

    /// Flips the next dora indicator. Returns the new indicator if one was
    /// still face down.
    pub fn turn_dora(&mut self) -> Option<u8> {
        if self.revealed >= MAX_DORA_INDICATORS {
            return None;
        }
        self.revealed += 1;
        self.dora_indicator_tiles.get(self.revealed - 1).copied()
    }

    pub fn dora_indicators(&self) -> &[u8] {
        &self.dora_indicator_tiles[..self.revealed.min(self.dora_indicator_tiles.len())]
    }

    pub fn ura_dora_indicators(&self) -> &[u8] {
        &self.ura_indicator_tiles[..self.revealed.min(self.ura_indicator_tiles.len())]
    }

    pub fn live_remaining(&self) -> usize {
        self.live.len()
    }

    /// Every tile still held by the wall, face-up indicators included.
    pub fn tile_total(&self) -> usize {
        self.live.len()
            + self.replacement.len()
            + self.dora_indicator_tiles.len()
            + self.ura_indicator_tiles.len()
    }
}

/// Seat offsets (from the dealer) receiving each dealt tile, in order.
pub fn deal_order(num_seats: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(13 * num_seats);
    for _ in 0..3 {
        for seat in 0..num_seats {
            order.extend(std::iter::repeat(seat).take(4));
        }
    }
    order.extend(0..num_seats);
    order
}

/// Builds preset walls for tests and replays.
///
/// Hands are given per seat for a round dealt by seat 0; anything left
/// unspecified is filled from the remaining tiles, lowest copy first.
#[derive(Debug, Clone)]
pub struct WallBuilder {
    num_seats: usize,
    dealer: Seat,
    hands: Vec<Vec<u8>>,
    draws: Vec<u8>,
    replacements: Vec<u8>,
    dora_indicators: Vec<u8>,
}

impl WallBuilder {
    pub fn new(num_seats: usize) -> Self {
        Self {
            num_seats,
            dealer: 0,
            hands: vec![Vec::new(); num_seats],
            draws: Vec::new(),
            replacements: Vec::new(),
            dora_indicators: Vec::new(),
        }
    }

    pub fn dealer(mut self, dealer: Seat) -> Self {
        self.dealer = dealer;
        self
    }

    pub fn hand(mut self, seat: Seat, tiles: &[u8]) -> Self {
        if let Some(h) = self.hands.get_mut(seat) {
            *h = tiles.to_vec();
        }
        self
    }

    /// Live draws in order, starting with the dealer's first draw.
    pub fn draws(mut self, tiles: &[u8]) -> Self {
        self.draws = tiles.to_vec();
        self
    }

    /// Replacement tiles in the order they will be drawn.
    pub fn replacements(mut self, tiles: &[u8]) -> Self {
        self.replacements = tiles.to_vec();
        self
    }

    pub fn dora_indicators(mut self, tiles: &[u8]) -> Self {
        self.dora_indicators = tiles.to_vec();
        self
    }

    pub fn build(self) -> EngineResult<Vec<u8>> {
        let n = self.num_seats;
        let total = tile_count(n);
        if self.replacements.len() > REPLACEMENT_POOL || self.dora_indicators.len() > MAX_DORA_INDICATORS {
            return Err(EngineError::InvalidConfig {
                message: "too many preset dead wall tiles".to_string(),
            });
        }

        let mut used = vec![false; 136];
        let specified = self
            .hands
            .iter()
            .flatten()
            .chain(&self.draws)
            .chain(&self.replacements)
            .chain(&self.dora_indicators);
        for &t in specified {
            let slot = used.get_mut(t as usize).ok_or_else(|| EngineError::InvalidConfig {
                message: format!("tile id {} out of range", t),
            })?;
            if *slot {
                return Err(EngineError::InvalidConfig {
                    message: format!("tile id {} used twice", t),
                });
            }
            *slot = true;
        }

        let mut pool: Vec<u8> = tile_set(n).into_iter().filter(|&t| !used[t as usize]).collect();
        // Copy-major order spreads filler tiles over many kinds.
        pool.sort_by_key(|&t| (t % 4, t / 4));
        let mut pool: VecDeque<u8> = pool.into();

        let mut hands: Vec<VecDeque<u8>> = self.hands.into_iter().map(VecDeque::from).collect();
        for hand in hands.iter_mut() {
            while hand.len() < 13 {
                let t = pool.pop_front().ok_or_else(|| EngineError::InvalidConfig {
                    message: "not enough tiles to fill hands".to_string(),
                })?;
                hand.push_back(t);
            }
        }

        let mut wall = Vec::with_capacity(total);
        for offset in deal_order(n) {
            let seat = (self.dealer + offset) % n;
            let t = hands[seat].pop_front().ok_or_else(|| EngineError::InvalidConfig {
                message: format!("seat {} has more than 13 preset tiles", seat),
            })?;
            wall.push(t);
        }
        if hands.iter().any(|h| !h.is_empty()) {
            return Err(EngineError::InvalidConfig {
                message: "a preset hand has more than 13 tiles".to_string(),
            });
        }
        wall.extend(&self.draws);

        let mut take = |count: usize, preset: &[u8]| -> EngineResult<Vec<u8>> {
            let mut out = preset.to_vec();
            while out.len() < count {
                out.push(pool.pop_back().ok_or_else(|| EngineError::InvalidConfig {
                    message: "not enough tiles for the dead wall".to_string(),
                })?);
            }
            Ok(out)
        };
        let ura = take(MAX_DORA_INDICATORS, &[])?;
        let dora = take(MAX_DORA_INDICATORS, &self.dora_indicators)?;
        let mut replacement = take(REPLACEMENT_POOL, &self.replacements)?;
        replacement.reverse();

        wall.extend(pool);
        wall.extend(ura);
        wall.extend(dora);
        wall.extend(replacement);
        Ok(wall)
    }
}
