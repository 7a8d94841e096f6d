use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::tile;
use crate::types::PointInfo;

/// Time the server waits beyond the players' own clock before forcing skips.
pub const SERVER_TIME_BUFFER_MS: u64 = 2_000;

/// How long the table waits for every client to finish loading.
pub const WAIT_FOR_LOADING_TIMEOUT_MS: u64 = 60_000;

/// Room-level rule toggles and timing, read once per round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// 4, or 3 for a three-seat table (bei-dora enabled, no chi).
    pub num_seats: usize,
    /// Dealer rotations before the game ends (4 = east only, 8 = east-south).
    pub round_count: u32,
    pub starting_points: i32,

    pub base_turn_time_ms: u64,
    /// Per-seat bonus budget granted at the start of every round.
    pub initial_bonus_time_ms: u64,
    pub server_time_buffer_ms: u64,
    pub wait_for_loading_timeout_ms: u64,
    /// A seat forced to Skip by the deadline loses its remaining bonus time.
    #[serde(default)]
    pub burn_bonus_time_on_timeout: bool,

    /// Smallest hand value that may be declared as a win.
    pub min_points_to_win: i32,
    /// A concealed kong may be robbed by a thirteen-orphans hand.
    pub allow_rob_concealed_kong_with_thirteen_orphans: bool,
    /// Winning on a bei-dora tile counts as robbing a kong.
    pub allow_bei_dora_rong_as_rob_kong: bool,
    /// The replacement draw after a bei-dora counts as ling-shang.
    pub allow_bei_dora_tsumo_as_ling_shang: bool,
    /// Three simultaneous rong claims abort the round instead of paying out.
    pub triple_rong_is_draw: bool,
    pub end_on_negative_score: bool,
    /// Total paid from noten to tenpai seats on an exhausted wall.
    pub noten_penalty: i32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::four_player()
    }
}

impl GameSettings {
    pub fn four_player() -> Self {
        Self {
            num_seats: 4,
            round_count: 8,
            starting_points: 25_000,
            base_turn_time_ms: 5_000,
            initial_bonus_time_ms: 20_000,
            server_time_buffer_ms: SERVER_TIME_BUFFER_MS,
            wait_for_loading_timeout_ms: WAIT_FOR_LOADING_TIMEOUT_MS,
            burn_bonus_time_on_timeout: false,
            min_points_to_win: 1_000,
            allow_rob_concealed_kong_with_thirteen_orphans: true,
            allow_bei_dora_rong_as_rob_kong: false,
            allow_bei_dora_tsumo_as_ling_shang: false,
            triple_rong_is_draw: true,
            end_on_negative_score: true,
            noten_penalty: 3_000,
        }
    }

    pub fn three_player() -> Self {
        Self {
            num_seats: 3,
            round_count: 6,
            starting_points: 35_000,
            allow_bei_dora_rong_as_rob_kong: true,
            allow_bei_dora_tsumo_as_ling_shang: true,
            triple_rong_is_draw: false,
            noten_penalty: 2_000,
            ..Self::four_player()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(3..=4).contains(&self.num_seats) {
            return Err(EngineError::InvalidConfig {
                message: format!("num_seats must be 3 or 4, got {}", self.num_seats),
            });
        }
        if self.round_count == 0 {
            return Err(EngineError::InvalidConfig {
                message: "round_count must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a computed hand may be declared as a win.
    pub fn check_constraint(&self, point: &PointInfo) -> bool {
        point.meets_minimum && point.points >= self.min_points_to_win
    }

    pub fn bei_dora_enabled(&self) -> bool {
        self.num_seats == 3
    }

    pub fn chi_enabled(&self) -> bool {
        self.num_seats == 4
    }

    pub fn total_tiles(&self) -> usize {
        tile::tile_count(self.num_seats)
    }

    /// Collection deadline for a window whose slowest eligible seat still has
    /// `max_bonus_time_ms` of bonus time.
    pub fn server_timeout_ms(&self, max_bonus_time_ms: u64) -> u64 {
        max_bonus_time_ms + self.base_turn_time_ms + self.server_time_buffer_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(GameSettings::four_player().validate().is_ok());
        assert!(GameSettings::three_player().validate().is_ok());
        let bad = GameSettings {
            num_seats: 5,
            ..GameSettings::default()
        };
        assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn constraint_requires_minimum_and_points() {
        let settings = GameSettings::four_player();
        let mut point = PointInfo {
            points: 2_000,
            satisfied_rules: vec!["riichi".to_string()],
            meets_minimum: true,
        };
        assert!(settings.check_constraint(&point));
        point.meets_minimum = false;
        assert!(!settings.check_constraint(&point));
        point.meets_minimum = true;
        point.points = 500;
        assert!(!settings.check_constraint(&point));
    }

    #[test]
    fn timeout_adds_base_and_buffer() {
        let settings = GameSettings::four_player();
        assert_eq!(settings.server_timeout_ms(10_000), 10_000 + 5_000 + 2_000);
    }

    #[test]
    fn three_player_toggles() {
        let settings = GameSettings::three_player();
        assert!(settings.bei_dora_enabled());
        assert!(!settings.chi_enabled());
        assert_eq!(settings.total_tiles(), 108);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = GameSettings::three_player();
        let json = serde_json::to_string(&settings).unwrap();
        let back: GameSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
