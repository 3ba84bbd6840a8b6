//! Simulation tunables.
//!
//! Every value feeds the deterministic state machine, so a replay is only
//! reproducible under the config that recorded it.

use serde::{Serialize, Deserialize};

use crate::game::error::SimError;

/// Configuration for level simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks a pushed Delay domino waits before falling
    pub delay_ticks: u8,
    /// Idle ticks on a ladder before the ant steps off by itself
    pub ladder_idle_ticks: u32,
    /// Idle ticks while carrying before the ant puts the domino down
    pub carry_place_ticks: u32,
    /// Ticks the ant holds still after a push
    pub push_recover_ticks: u8,
    /// Rows the ant survives falling
    pub fall_death_rows: u8,
    /// Ticks without domino movement before an unfinished level is judged
    pub settle_ticks: u32,
    /// Level time in ticks
    pub level_time_ticks: i32,
    /// Pushes the ant may make per level
    pub pushes_per_level: u8,
    /// Frame delay handed to the ant's animation helper
    pub ant_frame_delay: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            delay_ticks: 20,
            ladder_idle_ticks: 40,
            carry_place_ticks: 40,
            push_recover_ticks: 6,
            fall_death_rows: 4,
            settle_ticks: 60,
            level_time_ticks: 3600,
            pushes_per_level: 1,
            ant_frame_delay: 0,
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "delay_ticks": 5 }"#).unwrap();
        assert_eq!(config.delay_ticks, 5);
        assert_eq!(config.ladder_idle_ticks, 40);
        assert_eq!(config.pushes_per_level, 1);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(SimConfig::from_json("{ delay_ticks: }").is_err());
    }
}
