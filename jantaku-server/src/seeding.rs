//! Deterministic wall shuffling.
//!
//! Every deal is keyed by `(session seed, table nonce, RoundKey)`:
//! SHA-256 over those inputs seeds a `ChaCha8Rng`, which then drives a
//! Fisher-Yates pass over the table's tile set. Replaying a table with the
//! same seed and nonce reproduces every wall, including repeat rounds.

use jantaku_engine::state::RoundKey;
use jantaku_engine::tile::tile_set;
use jantaku_engine::WallSource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Fisher-Yates over `slice`, independent of `rand::seq` internals so the
/// output stays stable across rand releases.
pub fn fisher_yates_shuffle<T>(slice: &mut [T], rng: &mut impl Rng) {
    for i in (1..slice.len()).rev() {
        let j = rng.random_range(0..=i);
        slice.swap(i, j);
    }
}

/// `SHA-256(session_seed || nonce || hand_index || round_index || extra)`,
/// all integers little-endian.
pub fn derive_round_seed(session_seed: &[u8; 32], nonce: u64, key: &RoundKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(session_seed);
    hasher.update(nonce.to_le_bytes());
    hasher.update(key.hand_index.to_le_bytes());
    hasher.update(key.round_index.to_le_bytes());
    hasher.update(key.extra.to_le_bytes());
    hasher.finalize().into()
}

/// Shuffled tile set for one deal.
pub fn generate_wall(session_seed: &[u8; 32], nonce: u64, key: &RoundKey, num_seats: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::from_seed(derive_round_seed(session_seed, nonce, key));
    let mut wall = tile_set(num_seats);
    fisher_yates_shuffle(&mut wall, &mut rng);
    wall
}

/// Wall source for live tables.
#[derive(Debug, Clone)]
pub struct SeededWallSource {
    session_seed: [u8; 32],
    nonce: u64,
    num_seats: usize,
}

impl SeededWallSource {
    pub fn new(session_seed: [u8; 32], nonce: u64, num_seats: usize) -> Self {
        Self {
            session_seed,
            nonce,
            num_seats,
        }
    }
}

impl WallSource for SeededWallSource {
    fn next_wall(&mut self, key: &RoundKey) -> Vec<u8> {
        generate_wall(&self.session_seed, self.nonce, key, self.num_seats)
    }
}

/// Produces per-table seeds from one session seed.
///
/// ```
/// use jantaku_server::seeding::SessionRng;
///
/// let mut session = SessionRng::new([0u8; 32]);
/// assert_ne!(session.next_table_seed(), session.next_table_seed());
/// ```
pub struct SessionRng {
    seed: [u8; 32],
    table_index: u64,
}

impl SessionRng {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed, table_index: 0 }
    }

    pub fn table_index(&self) -> u64 {
        self.table_index
    }

    /// `SHA-256(session_seed || table_index)`, then advances the counter.
    pub fn next_table_seed(&mut self) -> [u8; 32] {
        let seed = table_seed(&self.seed, self.table_index);
        self.table_index += 1;
        seed
    }
}

/// Seed of the `index`-th table of a session, without walking the sequence.
pub fn table_seed(session_seed: &[u8; 32], index: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(session_seed);
    hasher.update(index.to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: [u8; 32] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E,
        0x1F, 0x20,
    ];

    fn key(hand_index: u64, round_index: u32, extra: u32) -> RoundKey {
        RoundKey {
            hand_index,
            round_index,
            extra,
        }
    }

    #[test]
    fn same_key_same_wall() {
        let a = generate_wall(&TEST_SEED, 42, &key(0, 0, 0), 4);
        let b = generate_wall(&TEST_SEED, 42, &key(0, 0, 0), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn every_key_field_changes_the_wall() {
        let base = generate_wall(&TEST_SEED, 0, &key(0, 0, 0), 4);
        assert_ne!(base, generate_wall(&TEST_SEED, 1, &key(0, 0, 0), 4));
        assert_ne!(base, generate_wall(&TEST_SEED, 0, &key(1, 0, 0), 4));
        assert_ne!(base, generate_wall(&TEST_SEED, 0, &key(0, 1, 0), 4));
        assert_ne!(base, generate_wall(&TEST_SEED, 0, &key(0, 0, 1), 4));
    }

    #[test]
    fn wall_is_a_shuffled_tile_set() {
        for num_seats in [3, 4] {
            let wall = generate_wall(&TEST_SEED, 7, &key(3, 1, 2), num_seats);
            let mut sorted = wall.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, tile_set(num_seats));
            assert_ne!(wall, tile_set(num_seats), "wall should be shuffled");
        }
    }

    #[test]
    fn source_follows_round_keys() {
        let mut source = SeededWallSource::new(TEST_SEED, 9, 4);
        let first = source.next_wall(&key(0, 0, 0));
        let repeat = source.next_wall(&key(1, 0, 1));
        assert_ne!(first, repeat);
        assert_eq!(first, source.next_wall(&key(0, 0, 0)));
    }

    #[test]
    fn fisher_yates_empty_and_single() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let mut empty: Vec<u8> = vec![];
        fisher_yates_shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut single = vec![42u8];
        fisher_yates_shuffle(&mut single, &mut rng);
        assert_eq!(single, vec![42]);
    }

    #[test]
    fn session_rng_is_deterministic_and_advances() {
        let mut a = SessionRng::new(TEST_SEED);
        let mut b = SessionRng::new(TEST_SEED);
        let seeds_a: Vec<[u8; 32]> = (0..10).map(|_| a.next_table_seed()).collect();
        let seeds_b: Vec<[u8; 32]> = (0..10).map(|_| b.next_table_seed()).collect();
        assert_eq!(seeds_a, seeds_b);
        assert_ne!(seeds_a[0], seeds_a[1]);
        assert_eq!(a.table_index(), 10);
        assert_eq!(seeds_a[3], table_seed(&TEST_SEED, 3));
    }
}
