//! Tile identities and kind helpers.
//!
//! Tiles are carried in 136-format: one id per physical tile, kind = `id / 4`.
//! Kinds 0-8 are 1m-9m, 9-17 are 1p-9p, 18-26 are 1s-9s, 27-30 are the
//! winds and 31-33 the dragons. Three-seat tables drop 2m-8m.

use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of distinct tile kinds (0-33).
pub const NUM_TILE_KINDS: usize = 34;

/// Number of tiles per suited category (1-9).
pub const NUM_SUIT_TILES: u8 = 9;

/// Physical tiles in a four-seat set.
pub const NUM_TILES_136: usize = 136;

/// Physical tiles in a three-seat set (2m-8m removed).
pub const NUM_TILES_SANMA: usize = 108;

pub const MANZU_START: u8 = 0;
pub const PINZU_START: u8 = 9;
pub const SOUZU_START: u8 = 18;
pub const JIHAI_START: u8 = 27;

pub const EAST: u8 = 27;
pub const SOUTH: u8 = 28;
pub const WEST: u8 = 29;
pub const NORTH: u8 = 30;
pub const HAKU: u8 = 31;
pub const HATSU: u8 = 32;
pub const CHUN: u8 = 33;

/// Red fives in 136-format: copy 0 of 5m, 5p and 5s.
pub const AKA_MANZU_136: u8 = 16;
pub const AKA_PINZU_136: u8 = 52;
pub const AKA_SOUZU_136: u8 = 88;

const KIND_NAMES: [&str; NUM_TILE_KINDS] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", //
    "1p", "2p", "3p", "4p", "5p", "6p", "7p", "8p", "9p", //
    "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s", //
    "E", "S", "W", "N", "P", "F", "C",
];

// ---------------------------------------------------------------------------
// Kind helpers
// ---------------------------------------------------------------------------

/// Kind (0-33) of a 136-format tile.
#[inline]
pub const fn kind(tile: u8) -> u8 {
    tile / 4
}

/// True for winds and dragons.
#[inline]
pub const fn is_honor(kind: u8) -> bool {
    kind >= JIHAI_START
}

/// True for 1 or 9 of any suit.
#[inline]
pub const fn is_terminal(kind: u8) -> bool {
    if kind >= JIHAI_START {
        return false;
    }
    let num = kind % NUM_SUIT_TILES;
    num == 0 || num == 8
}

#[inline]
pub const fn is_terminal_or_honor(kind: u8) -> bool {
    is_terminal(kind) || is_honor(kind)
}

#[inline]
pub const fn is_wind(kind: u8) -> bool {
    kind >= EAST && kind <= NORTH
}

#[inline]
pub const fn is_dragon(kind: u8) -> bool {
    kind >= HAKU && kind <= CHUN
}

/// 0-based number within the suit, or `None` for honors.
#[inline]
pub const fn suit_number(kind: u8) -> Option<u8> {
    if kind < JIHAI_START {
        Some(kind % NUM_SUIT_TILES)
    } else {
        None
    }
}

/// Returns `true` if the 136-format tile is a red five.
#[inline]
pub const fn is_aka(tile: u8) -> bool {
    matches!(tile, AKA_MANZU_136 | AKA_PINZU_136 | AKA_SOUZU_136)
}

/// Tiles removed from a three-seat set (2m-8m).
#[inline]
pub const fn is_sanma_excluded_tile(tile: u8) -> bool {
    let k = tile / 4;
    k >= 1 && k <= 7
}

/// The dora kind indicated by an indicator kind.
///
/// In three-seat play the manzu suit is only 1m/9m, so 1m points to 9m.
pub fn dora_kind(indicator_kind: u8, three_seat: bool) -> u8 {
    match indicator_kind {
        0 if three_seat => 8,
        0..=8 => (indicator_kind + 1) % 9,
        9..=17 => 9 + (indicator_kind - 9 + 1) % 9,
        18..=26 => 18 + (indicator_kind - 18 + 1) % 9,
        27..=30 => 27 + (indicator_kind - 27 + 1) % 4,
        31..=33 => 31 + (indicator_kind - 31 + 1) % 3,
        _ => indicator_kind,
    }
}

/// Full ordered tile set for a table of `num_seats` seats.
pub fn tile_set(num_seats: usize) -> Vec<u8> {
    (0..NUM_TILES_136 as u8)
        .filter(|&t| num_seats != 3 || !is_sanma_excluded_tile(t))
        .collect()
}

/// Number of physical tiles for a table of `num_seats` seats.
pub fn tile_count(num_seats: usize) -> usize {
    if num_seats == 3 {
        NUM_TILES_SANMA
    } else {
        NUM_TILES_136
    }
}

/// Short name of a kind, e.g. `"5p"` or `"N"`.
pub fn kind_name(kind: u8) -> &'static str {
    KIND_NAMES.get(kind as usize).copied().unwrap_or("?")
}

/// Kind histogram of a slice of 136-format tiles.
pub fn kind_counts(tiles: &[u8]) -> [u8; NUM_TILE_KINDS] {
    let mut counts = [0u8; NUM_TILE_KINDS];
    for &t in tiles {
        if let Some(c) = counts.get_mut(kind(t) as usize) {
            *c += 1;
        }
    }
    counts
}

/// Display wrapper for a 136-format tile (`0r` marks a red five).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TileName(pub u8);

impl fmt::Display for TileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_aka(self.0) {
            let name = kind_name(kind(self.0));
            write!(f, "0{}", &name[1..])
        } else {
            f.write_str(kind_name(kind(self.0)))
        }
    }
}

impl fmt::Debug for TileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dora_wrapping() {
        assert_eq!(dora_kind(0, false), 1); // 1m -> 2m
        assert_eq!(dora_kind(8, false), 0); // 9m -> 1m
        assert_eq!(dora_kind(0, true), 8); // sanma 1m -> 9m
        assert_eq!(dora_kind(8, true), 0);
        assert_eq!(dora_kind(EAST, false), SOUTH);
        assert_eq!(dora_kind(NORTH, false), EAST);
        assert_eq!(dora_kind(HAKU, false), HATSU);
        assert_eq!(dora_kind(CHUN, false), HAKU);
    }

    #[test]
    fn tile_sets_have_expected_sizes() {
        assert_eq!(tile_set(4).len(), NUM_TILES_136);
        assert_eq!(tile_set(3).len(), NUM_TILES_SANMA);
        assert!(tile_set(3).iter().all(|&t| !is_sanma_excluded_tile(t)));
    }

    #[test]
    fn terminal_and_honor_classification() {
        assert!(is_terminal(0));
        assert!(is_terminal(8));
        assert!(!is_terminal(4));
        assert!(is_terminal(26));
        assert!(!is_terminal(EAST));
        assert!(is_honor(CHUN));
        assert!(is_terminal_or_honor(NORTH));
        assert!(is_wind(NORTH));
        assert!(is_dragon(HATSU));
    }

    #[test]
    fn tile_names() {
        assert_eq!(TileName(0).to_string(), "1m");
        assert_eq!(TileName(AKA_PINZU_136).to_string(), "0p");
        assert_eq!(TileName(NORTH * 4 + 2).to_string(), "N");
    }
}
