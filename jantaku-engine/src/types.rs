use serde::{Deserialize, Serialize};

use crate::tile::kind;

/// Seat index in turn order (0 = first seat of the seat list).
pub type Seat = usize;

/// Steps from `from` to `to` going forward in turn order.
#[inline]
pub fn seat_distance(from: Seat, to: Seat, num_seats: usize) -> usize {
    (to + num_seats - from) % num_seats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldKind {
    Chi,
    Pon,
    OpenKong,
    AddedKong,
    ConcealedKong,
}

impl MeldKind {
    pub fn is_kong(self) -> bool {
        matches!(
            self,
            MeldKind::OpenKong | MeldKind::AddedKong | MeldKind::ConcealedKong
        )
    }
}

/// An exposed (or concealed-kong) set on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    /// All tiles of the set, sorted.
    pub tiles: Vec<u8>,
    /// The tile taken from another seat's discard (chi/pon/open kong), or the
    /// tile added to a pon (added kong).
    pub called_tile: Option<u8>,
    /// The seat the called tile came from.
    pub from_seat: Option<Seat>,
}

impl Meld {
    pub fn new(kind: MeldKind, tiles: Vec<u8>, called_tile: Option<u8>, from_seat: Option<Seat>) -> Self {
        let mut tiles = tiles;
        tiles.sort_unstable();
        Self {
            kind,
            tiles,
            called_tile,
            from_seat,
        }
    }

    pub fn is_kong(&self) -> bool {
        self.kind.is_kong()
    }

    /// Concealed kongs keep the hand closed.
    pub fn is_open(&self) -> bool {
        self.kind != MeldKind::ConcealedKong
    }

    /// Kind of the set's first tile.
    pub fn first_kind(&self) -> u8 {
        self.tiles.first().map(|&t| kind(t)).unwrap_or(u8::MAX)
    }
}

/// Result of the external hand evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointInfo {
    /// Value of the hand as paid on a discard win.
    pub points: i32,
    /// Names of the rules the hand satisfies.
    pub satisfied_rules: Vec<String>,
    /// Whether the hand reaches the minimum required to declare a win.
    pub meets_minimum: bool,
}

impl PointInfo {
    pub fn has_rule(&self, prefix: &str) -> bool {
        self.satisfied_rules.iter().any(|r| r.starts_with(prefix))
    }
}

/// Situational flags passed to the hand evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandStatus {
    pub tsumo: bool,
    pub riichi: bool,
    pub one_shot: bool,
    pub rob_kong: bool,
    pub ling_shang: bool,
    /// Win on the last drawable tile or its discard.
    pub last_tile: bool,
    /// Win in the first uninterrupted go-around.
    pub first_turn: bool,
}

/// Wind of a seat or of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Wind {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl From<usize> for Wind {
    fn from(val: usize) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            _ => Wind::North,
        }
    }
}

impl Wind {
    /// Tile kind of the wind (27-30).
    pub fn tile_kind(self) -> u8 {
        crate::tile::EAST + self as u8
    }
}

/// A single score movement. `from: None` pays out of the riichi stick pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Option<Seat>,
    pub to: Seat,
    pub amount: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_distance_wraps() {
        assert_eq!(seat_distance(0, 1, 4), 1);
        assert_eq!(seat_distance(3, 0, 4), 1);
        assert_eq!(seat_distance(2, 1, 4), 3);
        assert_eq!(seat_distance(1, 0, 3), 2);
    }

    #[test]
    fn meld_tiles_are_sorted() {
        let meld = Meld::new(MeldKind::Pon, vec![10, 8, 9], Some(10), Some(1));
        assert_eq!(meld.tiles, vec![8, 9, 10]);
        assert_eq!(meld.first_kind(), 2);
        assert!(meld.is_open());
        assert!(!meld.is_kong());
    }

    #[test]
    fn wind_kinds() {
        assert_eq!(Wind::from(0usize).tile_kind(), 27);
        assert_eq!(Wind::from(7usize), Wind::North);
    }
}
