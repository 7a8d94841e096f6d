//! Batch simulation of bot-only tables with rayon parallelism.
//!
//! Each table runs on its own `ManualClock`; bots answer inline, so a table
//! advances one window per tick and never waits on a deadline.

use std::sync::Arc;

use jantaku_engine::{BotParticipant, Driver, GameSettings, ManualClock, Phase, StandardEvaluator};
use rayon::prelude::*;

use crate::seeding::{table_seed, SeededWallSource};

/// Ticks after which a table is abandoned.
pub const MAX_TICKS: u32 = 200_000;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub num_tables: usize,
    pub session_seed: [u8; 32],
    /// Rayon pool size. `None` uses the rayon default.
    pub num_threads: Option<usize>,
    pub settings: GameSettings,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_tables: 100,
            session_seed: [0u8; 32],
            num_threads: None,
            settings: GameSettings::four_player(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableResult {
    pub scores: Vec<i32>,
    /// Deals made, repeat rounds included.
    pub deals: u64,
    pub ticks: u32,
    /// Epoch when the table stopped; one per phase entered.
    pub epoch: u64,
    /// Set when the table ended in `Abort` or ran out of ticks.
    pub failure: Option<String>,
}

/// Plays one bot-only table to the end.
pub fn simulate_table(settings: &GameSettings, seed: [u8; 32]) -> anyhow::Result<TableResult> {
    let participants = (0..settings.num_seats).map(BotParticipant::boxed).collect();
    let mut driver = Driver::new(
        settings.clone(),
        participants,
        Box::new(StandardEvaluator::default()),
        Box::new(SeededWallSource::new(seed, 0, settings.num_seats)),
        Arc::new(ManualClock::new(0)),
    )?;
    driver.start()?;

    let mut ticks = 0;
    let mut failure = None;
    while !driver.is_finished() {
        if ticks >= MAX_TICKS {
            failure = Some(format!("no result after {} ticks", MAX_TICKS));
            break;
        }
        ticks += 1;
        if let Err(e) = driver.tick() {
            failure = Some(e.to_string());
            break;
        }
    }
    if let Phase::Abort { reason } = driver.phase() {
        failure.get_or_insert_with(|| reason.clone());
    }

    let round = driver.round();
    Ok(TableResult {
        scores: round.map(|r| r.scores()).unwrap_or_default(),
        deals: round.map_or(0, |r| r.hand_index),
        ticks,
        epoch: driver.epoch(),
        failure,
    })
}

fn run_tables(config: &BatchConfig) -> Vec<anyhow::Result<TableResult>> {
    (0..config.num_tables)
        .into_par_iter()
        .map(|i| simulate_table(&config.settings, table_seed(&config.session_seed, i as u64)))
        .collect()
}

/// Parallel batch runner on a dedicated rayon pool.
pub struct BatchSimulator {
    pool: rayon::ThreadPool,
}

impl BatchSimulator {
    pub fn new(num_threads: Option<usize>) -> anyhow::Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))?;
        Ok(Self { pool })
    }

    pub fn run_batch(&self, config: &BatchConfig) -> Vec<anyhow::Result<TableResult>> {
        self.pool.install(|| run_tables(config))
    }
}

/// Runs a batch on rayon's global pool.
pub fn run_batch_simple(config: &BatchConfig) -> Vec<anyhow::Result<TableResult>> {
    run_tables(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_table_completes() {
        let settings = GameSettings::four_player();
        let result = simulate_table(&settings, [7u8; 32]).unwrap();
        assert_eq!(result.failure, None);
        assert!(result.deals >= 8);
        assert_eq!(result.scores.iter().sum::<i32>(), 100_000);
    }

    #[test]
    fn seeded_tables_are_deterministic() {
        let settings = GameSettings::four_player();
        let a = simulate_table(&settings, [9u8; 32]).unwrap();
        let b = simulate_table(&settings, [9u8; 32]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn three_seat_table_completes() {
        let settings = GameSettings::three_player();
        let result = simulate_table(&settings, [3u8; 32]).unwrap();
        assert_eq!(result.failure, None);
        assert_eq!(result.scores.len(), 3);
        assert_eq!(result.scores.iter().sum::<i32>(), 105_000);
    }

    #[test]
    fn batch_on_dedicated_pool() {
        let config = BatchConfig {
            num_tables: 4,
            num_threads: Some(2),
            ..Default::default()
        };
        let sim = BatchSimulator::new(config.num_threads).unwrap();
        let results = sim.run_batch(&config);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|t| t.failure.is_none())));
        assert_eq!(run_batch_simple(&config).len(), 4);
    }
}
