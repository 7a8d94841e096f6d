//! Winning-shape checks on kind histograms.
//!
//! Only the shape is decided here. Whether a shaped hand is worth anything is
//! left to the `HandEvaluator` implementation.

use crate::tile::{is_terminal_or_honor, JIHAI_START, NUM_TILE_KINDS};

pub type Counts = [u8; NUM_TILE_KINDS];

/// Standard shape: `sets` sets plus one pair.
pub fn is_standard(counts: &Counts, sets: usize) -> bool {
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    if total != sets * 3 + 2 {
        return false;
    }
    let mut work = *counts;
    for pair in 0..NUM_TILE_KINDS {
        if work[pair] >= 2 {
            work[pair] -= 2;
            if decompose(&mut work, 0) {
                return true;
            }
            work[pair] += 2;
        }
    }
    false
}

fn decompose(counts: &mut Counts, start: usize) -> bool {
    let mut i = start;
    while i < NUM_TILE_KINDS && counts[i] == 0 {
        i += 1;
    }
    if i == NUM_TILE_KINDS {
        return true;
    }

    if counts[i] >= 3 {
        counts[i] -= 3;
        let ok = decompose(counts, i);
        counts[i] += 3;
        if ok {
            return true;
        }
    }

    let k = i as u8;
    if k < JIHAI_START && k % 9 <= 6 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        counts[i] -= 1;
        counts[i + 1] -= 1;
        counts[i + 2] -= 1;
        let ok = decompose(counts, i);
        counts[i] += 1;
        counts[i + 1] += 1;
        counts[i + 2] += 1;
        if ok {
            return true;
        }
    }
    false
}

/// Seven distinct pairs (closed hands only).
pub fn is_seven_pairs(counts: &Counts) -> bool {
    counts.iter().filter(|&&c| c == 2).count() == 7
}

/// One of each terminal/honor kind plus one duplicate (closed hands only).
pub fn is_thirteen_orphans(counts: &Counts) -> bool {
    let mut has_pair = false;
    for (k, &c) in counts.iter().enumerate() {
        if is_terminal_or_honor(k as u8) {
            match c {
                1 => {}
                2 if !has_pair => has_pair = true,
                _ => return false,
            }
        } else if c != 0 {
            return false;
        }
    }
    has_pair
}

/// Any winning shape for a hand with `open_sets` sets already on the table.
pub fn is_agari(counts: &Counts, open_sets: usize) -> bool {
    if open_sets == 0 && (is_seven_pairs(counts) || is_thirteen_orphans(counts)) {
        return true;
    }
    is_standard(counts, 4 - open_sets.min(4))
}

/// Kinds that would complete the hand.
pub fn waits(counts: &Counts, open_sets: usize) -> Vec<u8> {
    let mut work = *counts;
    let mut out = Vec::new();
    for k in 0..NUM_TILE_KINDS {
        if work[k] >= 4 {
            continue;
        }
        work[k] += 1;
        if is_agari(&work, open_sets) {
            out.push(k as u8);
        }
        work[k] -= 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts_of(kinds: &[u8]) -> Counts {
        let mut c = [0u8; NUM_TILE_KINDS];
        for &k in kinds {
            c[k as usize] += 1;
        }
        c
    }

    #[test]
    fn standard_hand() {
        // 123m 456m 789m 123p 11s
        let c = counts_of(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 18, 18]);
        assert!(is_standard(&c, 4));
        assert!(is_agari(&c, 0));
    }

    #[test]
    fn open_hand_needs_fewer_sets() {
        // 123m 55p with two sets on the table
        let c = counts_of(&[0, 1, 2, 13, 13]);
        assert!(is_agari(&c, 3));
        assert!(!is_agari(&c, 0));
    }

    #[test]
    fn seven_pairs_and_orphans() {
        let pairs = counts_of(&[0, 0, 2, 2, 4, 4, 6, 6, 8, 8, 10, 10, 12, 12]);
        assert!(is_seven_pairs(&pairs));
        assert!(is_agari(&pairs, 0));

        let orphans = counts_of(&[0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33, 0]);
        assert!(is_thirteen_orphans(&orphans));
        assert!(is_agari(&orphans, 0));
    }

    #[test]
    fn waits_of_two_sided_shape() {
        // 123m 456m 789m 11p 45s -> waits 3s/6s
        let c = counts_of(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 21, 22]);
        assert_eq!(waits(&c, 0), vec![20, 23]);
    }

    #[test]
    fn not_agari() {
        let c = counts_of(&[0, 1, 3, 4, 6, 7, 9, 10, 12, 13, 15, 16, 18, 20]);
        assert!(!is_agari(&c, 0));
        assert!(waits(&counts_of(&[0, 4, 8, 12, 16, 20, 24, 27, 28, 29, 30, 31, 32]), 0).is_empty());
    }
}
