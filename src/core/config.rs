//! AI configuration with documented constants
//!
//! All tuning numbers used by the decision engine are collected here with
//! explanations of what they control. Every section deserializes with
//! defaults, so a TOML file only needs to name the values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{AiError, Result};

/// Fleet movement tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Ticks to wait before re-ordering a blocked ship
    ///
    /// Blocked ships retry forever at this interval until they unblock or
    /// the fleet is disbanded.
    pub retry_blocked_ticks: u64,

    /// Radius of the area a multi-ship fleet is sent to instead of a point
    ///
    /// Keeps ships from fighting over the exact destination cell.
    pub spread_radius: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            retry_blocked_ticks: 16,
            spread_radius: 3.0,
        }
    }
}

/// Lookout tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Detection radius around every member of a multi-ship group
    pub fleet_search_radius: f64,

    /// Detection radius around a lone ship
    pub single_ship_search_radius: f64,

    /// Distance from home under which a pirate ship counts as "at home"
    pub home_radius: f64,

    /// Log detection radii on every lookout (very noisy)
    pub debug_radii: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            fleet_search_radius: 15.0,
            single_ship_search_radius: 12.0,
            home_radius: 6.0,
            debug_radii: false,
        }
    }
}

/// Behavior selection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Score sums below this value select nothing
    pub selection_epsilon: f64,

    /// Largest bounding-box diagonal for which a group still counts as one fleet
    pub fleet_max_dispersion: f64,

    /// Fraction of a patrolling group that has to arrive
    pub patrol_completion_ratio: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            selection_epsilon: 1e-7,
            fleet_max_dispersion: 10.0,
            patrol_completion_ratio: 0.5,
        }
    }
}

/// Strategy cadence and condition priorities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Ticks between strategy evaluations
    pub strategy_interval: u64,

    /// Ticks between combat lookouts
    pub lookout_interval: u64,

    /// Ticks between diplomacy evaluations
    pub diplomacy_interval: u64,

    /// Design priority of "another faction settled on our island"
    pub sharing_island_priority: f64,

    /// Design priority of "a faction is at war with us"
    pub hostile_priority: f64,

    /// Design priority of "a neutral faction exists"
    pub neutral_priority: f64,

    /// Design priority of the pirate patrol routine
    pub pirate_routine_priority: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy_interval: 30,
            lookout_interval: 4,
            diplomacy_interval: 200,
            sharing_island_priority: 1.5,
            hostile_priority: 1.0,
            neutral_priority: 0.3,
            pirate_routine_priority: 1.0,
        }
    }
}

/// Mission-specific parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Fraction of a scouting fleet that must arrive before the next leg
    pub scouting_completion_ratio: f64,

    /// How close a chasing fleet sails to its target unit
    pub chase_target_range: f64,

    /// Fraction of a chasing fleet that must reach the target area
    pub chase_completion_ratio: f64,

    /// Radius of the area a surprise attack sails into
    pub surprise_attack_radius: f64,

    /// Fraction of a surprise attack fleet that must arrive at each leg
    pub surprise_completion_ratio: f64,

    /// Fraction of a fleeing fleet that must get home
    pub flee_completion_ratio: f64,

    /// Fraction of a pirate routine fleet that must arrive at each leg
    pub pirate_completion_ratio: f64,

    /// Radius of the home area missions return to
    pub home_area_radius: f64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            scouting_completion_ratio: 0.5,
            chase_target_range: 5.0,
            chase_completion_ratio: 0.5,
            surprise_attack_radius: 10.0,
            surprise_completion_ratio: 0.5,
            flee_completion_ratio: 0.5,
            pirate_completion_ratio: 1.0,
            home_area_radius: 6.0,
        }
    }
}

/// Balance helper tuning (wealth/power/terrain ratios between factions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Raw ratios are clamped to `[1/trim_factor, trim_factor]`
    pub trim_factor: f64,

    /// Clamped ratios map onto `[-linear_boundary, linear_boundary]`
    pub linear_boundary: f64,

    pub gold_weight: f64,
    pub inventory_weight: f64,
    pub territory_weight: f64,
    pub settlement_weight: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            trim_factor: 4.0,
            linear_boundary: 10.0,
            gold_weight: 1.0,
            inventory_weight: 0.5,
            territory_weight: 1.0,
            settlement_weight: 20.0,
        }
    }
}

/// Thresholds on the combined balance (in `[-linear_boundary, linear_boundary]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    /// A warlike faction declares war on a neutral at or above this balance
    pub war_threshold: f64,

    /// A peaceful faction offers peace to an enemy at or below this balance
    pub peace_threshold: f64,

    /// A peaceful faction allies with a neutral whose balance is within this band
    pub alliance_band: f64,
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            war_threshold: 3.0,
            peace_threshold: -3.0,
            alliance_band: 1.0,
        }
    }
}

/// Complete AI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub fleet: FleetConfig,
    pub combat: CombatConfig,
    pub behavior: BehaviorConfig,
    pub strategy: StrategyConfig,
    pub missions: MissionConfig,
    pub balance: BalanceConfig,
    pub diplomacy: DiplomacyConfig,
}

impl AiConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing values fall back to defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("behavior.patrol_completion_ratio", self.behavior.patrol_completion_ratio),
            ("missions.scouting_completion_ratio", self.missions.scouting_completion_ratio),
            ("missions.chase_completion_ratio", self.missions.chase_completion_ratio),
            ("missions.surprise_completion_ratio", self.missions.surprise_completion_ratio),
            ("missions.flee_completion_ratio", self.missions.flee_completion_ratio),
            ("missions.pirate_completion_ratio", self.missions.pirate_completion_ratio),
        ];
        for (name, ratio) in ratios {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(AiError::InvalidConfig(format!(
                    "{} ({}) must be in (0, 1]",
                    name, ratio
                )));
            }
        }

        if self.combat.fleet_search_radius <= 0.0 || self.combat.single_ship_search_radius <= 0.0
        {
            return Err(AiError::InvalidConfig("Search radii must be positive".into()));
        }

        if self.fleet.retry_blocked_ticks == 0 {
            return Err(AiError::InvalidConfig(
                "fleet.retry_blocked_ticks must be at least 1".into(),
            ));
        }

        if self.strategy.strategy_interval == 0
            || self.strategy.lookout_interval == 0
            || self.strategy.diplomacy_interval == 0
        {
            return Err(AiError::InvalidConfig("Tick intervals must be at least 1".into()));
        }

        if self.balance.trim_factor <= 1.0 {
            return Err(AiError::InvalidConfig(format!(
                "balance.trim_factor ({}) must be > 1",
                self.balance.trim_factor
            )));
        }

        if self.balance.linear_boundary <= 0.0 {
            return Err(AiError::InvalidConfig(
                "balance.linear_boundary must be positive".into(),
            ));
        }

        if self.diplomacy.peace_threshold >= self.diplomacy.war_threshold {
            return Err(AiError::InvalidConfig(format!(
                "diplomacy.peace_threshold ({}) should be < war_threshold ({})",
                self.diplomacy.peace_threshold, self.diplomacy.war_threshold
            )));
        }

        if self.behavior.selection_epsilon <= 0.0 {
            return Err(AiError::InvalidConfig(
                "behavior.selection_epsilon must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_retry_interval() {
        assert_eq!(AiConfig::default().fleet.retry_blocked_ticks, 16);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            [combat]
            fleet_search_radius = 20.0
            "#,
        )
        .expect("Should parse partial config");
        assert_eq!(config.combat.fleet_search_radius, 20.0);
        assert_eq!(config.combat.single_ship_search_radius, 12.0);
        assert_eq!(config.strategy.strategy_interval, 30);
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = AiConfig::from_toml_str(include_str!("../../data/ai_config.toml"))
            .expect("Bundled config should be valid");
        assert!(config.strategy.hostile_priority > 0.0);
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let err = AiConfig::from_toml_str(
            r#"
            [missions]
            chase_completion_ratio = 1.5
            "#,
        );
        assert!(matches!(err, Err(AiError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_trim_factor_at_parity() {
        let mut config = AiConfig::default();
        config.balance.trim_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_diplomacy_thresholds() {
        let mut config = AiConfig::default();
        config.diplomacy.peace_threshold = 5.0;
        assert!(config.validate().is_err());
    }
}
