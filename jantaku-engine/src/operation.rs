use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tile::TileName;
use crate::types::PointInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Pass. In an in-turn window this discards the default tile.
    Skip,
    Discard,
    /// Discard while declaring riichi.
    Riichi,
    Tsumo,
    /// Concealed or added kong in turn, open kong on a discard.
    Kong,
    BeiDora,
    /// Abortive draw on nine distinct terminal/honor kinds.
    NineOrphans,
    Chi,
    Pon,
    Rong,
}

impl OperationKind {
    /// Claim precedence on another seat's tile: rong > kong = pon > chi > skip.
    pub fn claim_rank(self) -> u8 {
        match self {
            OperationKind::Rong => 3,
            OperationKind::Kong | OperationKind::Pon => 2,
            OperationKind::Chi => 1,
            _ => 0,
        }
    }

    pub fn is_win(self) -> bool {
        matches!(self, OperationKind::Rong | OperationKind::Tsumo)
    }
}

/// A seat's decision for one collection window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub tile: Option<u8>,
    /// Tiles taken from the hand: two for chi/pon, three for an open kong,
    /// four for a concealed kong, one for an added kong.
    #[serde(default)]
    pub consumed: Vec<u8>,
    /// Server-computed hand value for win claims.
    #[serde(default)]
    pub point: Option<PointInfo>,
}

impl Operation {
    pub fn new(kind: OperationKind, tile: Option<u8>, consumed: &[u8]) -> Self {
        let mut consumed = consumed.to_vec();
        consumed.sort_unstable();
        Self {
            kind,
            tile,
            consumed,
            point: None,
        }
    }

    pub fn skip() -> Self {
        Self::new(OperationKind::Skip, None, &[])
    }

    pub fn discard(tile: u8) -> Self {
        Self::new(OperationKind::Discard, Some(tile), &[])
    }

    pub fn riichi(tile: u8) -> Self {
        Self::new(OperationKind::Riichi, Some(tile), &[])
    }

    pub fn tsumo(tile: u8, point: PointInfo) -> Self {
        Self {
            point: Some(point),
            ..Self::new(OperationKind::Tsumo, Some(tile), &[])
        }
    }

    pub fn rong(tile: u8, point: PointInfo) -> Self {
        Self {
            point: Some(point),
            ..Self::new(OperationKind::Rong, Some(tile), &[])
        }
    }

    pub fn kong(tile: u8, consumed: &[u8]) -> Self {
        Self::new(OperationKind::Kong, Some(tile), consumed)
    }

    pub fn pon(tile: u8, consumed: &[u8]) -> Self {
        Self::new(OperationKind::Pon, Some(tile), consumed)
    }

    pub fn chi(tile: u8, consumed: &[u8]) -> Self {
        Self::new(OperationKind::Chi, Some(tile), consumed)
    }

    pub fn bei_dora(tile: u8) -> Self {
        Self::new(OperationKind::BeiDora, Some(tile), &[])
    }

    pub fn nine_orphans() -> Self {
        Self::new(OperationKind::NineOrphans, None, &[])
    }

    pub fn is_skip(&self) -> bool {
        self.kind == OperationKind::Skip
    }

    /// Whether a submitted operation selects this offered one.
    ///
    /// Clients may omit the tile or the consumed tiles when the kind alone
    /// identifies the choice.
    pub fn selects(&self, offered: &Operation) -> bool {
        if self.kind != offered.kind {
            return false;
        }
        if self.tile.is_some() && self.tile != offered.tile {
            return false;
        }
        if !self.consumed.is_empty() {
            let mut mine = self.consumed.clone();
            mine.sort_unstable();
            if mine != offered.consumed {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(t) = self.tile {
            write!(f, "({})", TileName(t))?;
        }
        if !self.consumed.is_empty() {
            let names: Vec<String> = self.consumed.iter().map(|&t| TileName(t).to_string()).collect();
            write!(f, "[{}]", names.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_ranks_follow_precedence() {
        assert!(OperationKind::Rong.claim_rank() > OperationKind::Pon.claim_rank());
        assert_eq!(OperationKind::Kong.claim_rank(), OperationKind::Pon.claim_rank());
        assert!(OperationKind::Pon.claim_rank() > OperationKind::Chi.claim_rank());
        assert!(OperationKind::Chi.claim_rank() > OperationKind::Skip.claim_rank());
    }

    #[test]
    fn selects_allows_omitted_details() {
        let offered = Operation::pon(40, &[41, 42]);
        assert!(Operation::new(OperationKind::Pon, None, &[]).selects(&offered));
        assert!(Operation::pon(40, &[42, 41]).selects(&offered));
        assert!(!Operation::pon(40, &[41, 43]).selects(&offered));
        assert!(!Operation::pon(44, &[]).selects(&offered));
        assert!(!Operation::chi(40, &[41, 42]).selects(&offered));
    }

    #[test]
    fn display_names_tiles() {
        assert_eq!(Operation::chi(0, &[4, 8]).to_string(), "Chi(1m)[2m,3m]");
        assert_eq!(Operation::skip().to_string(), "Skip");
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let op: Operation = serde_json::from_str(r#"{"kind":"Rong","tile":null}"#).unwrap();
        assert_eq!(op.kind, OperationKind::Rong);
        assert!(op.consumed.is_empty());
        assert!(op.point.is_none());
    }
}
