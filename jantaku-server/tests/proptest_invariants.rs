//! Property-based invariant tests for whole tables.
//!
//! Every seat picks uniformly among its offered operations with a seeded
//! RNG, so claims, kongs, riichi and wins all show up. After every tick the
//! round must conserve tiles and points.

use std::sync::Arc;

use jantaku_engine::{
    Driver, GameSettings, ManualClock, Operation, OperationRequest, Participant, Phase, ServerEvent,
    StandardEvaluator,
};
use jantaku_server::seeding::{table_seed, SeededWallSource};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MAX_TICKS: u32 = 50_000;

/// Answers inline with a random offered operation.
struct RandomSeat {
    seat: usize,
    rng: ChaCha8Rng,
}

impl Participant for RandomSeat {
    fn seat(&self) -> usize {
        self.seat
    }

    fn name(&self) -> &str {
        "random"
    }

    fn is_bot(&self) -> bool {
        false
    }

    fn request_ready(&mut self) -> bool {
        true
    }

    fn request(&mut self, request: &OperationRequest) -> Option<Operation> {
        let ops = &request.operations;
        if ops.is_empty() {
            return Some(Operation::skip());
        }
        Some(ops[self.rng.random_range(0..ops.len())].clone())
    }

    fn notify(&mut self, _event: &ServerEvent) {}
}

fn random_table(settings: GameSettings, seed: u64) -> Driver {
    let wall_seed = table_seed(&[0x5A; 32], seed);
    let seats = (0..settings.num_seats)
        .map(|seat| -> Box<dyn Participant> {
            Box::new(RandomSeat {
                seat,
                rng: ChaCha8Rng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(seat as u64)),
            })
        })
        .collect();
    let num_seats = settings.num_seats;
    Driver::new(
        settings,
        seats,
        Box::new(StandardEvaluator::default()),
        Box::new(SeededWallSource::new(wall_seed, seed, num_seats)),
        Arc::new(ManualClock::new(0)),
    )
    .unwrap()
}

/// Points on the table, riichi deposits included.
fn points_in_play(driver: &Driver) -> i32 {
    driver.round().map_or(0, |r| {
        r.scores().iter().sum::<i32>() + r.sticks as i32 * 1_000
    })
}

fn play(settings: GameSettings, seed: u64) -> Result<(), TestCaseError> {
    let total = settings.starting_points * settings.num_seats as i32;
    let mut driver = random_table(settings, seed);
    driver.start().unwrap();

    let mut ticks = 0;
    while !driver.is_finished() && ticks < MAX_TICKS {
        let before = driver.epoch();
        let moved = driver.tick();
        prop_assert!(moved.is_ok(), "seed {seed}: {:?}", moved);
        prop_assert!(driver.epoch() > before, "seed {seed}: tick {ticks} made no progress");
        ticks += 1;

        let round = driver.round().unwrap();
        let verified = round.verify();
        prop_assert!(verified.is_ok(), "seed {seed}: {:?}", verified);
        prop_assert_eq!(points_in_play(&driver), total, "seed {}: points leaked", seed);
    }
    prop_assert_eq!(driver.phase(), &Phase::GameEnd, "seed {}", seed);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn four_seat_tables_conserve_tiles_and_points(seed in 0u64..1_000_000) {
        play(GameSettings::four_player(), seed)?;
    }

    #[test]
    fn three_seat_tables_conserve_tiles_and_points(seed in 0u64..1_000_000) {
        play(GameSettings::three_player(), seed)?;
    }
}

#[test]
fn same_seed_same_game() {
    let run = |seed| {
        let mut driver = random_table(GameSettings::four_player(), seed);
        driver.start().unwrap();
        while !driver.is_finished() {
            driver.tick().unwrap();
        }
        (driver.epoch(), driver.round().unwrap().scores())
    };
    assert_eq!(run(11), run(11));
}
