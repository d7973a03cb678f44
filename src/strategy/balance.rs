//! Balance between two factions
//!
//! Raw ratios are clamped to `[1/trim, trim]` and rescaled onto
//! `[-boundary, boundary]`, 0 meaning parity. Ratios below 1 are inverted
//! and negated first so "half as strong" mirrors "twice as strong".

use serde::{Deserialize, Serialize};

use crate::core::config::BalanceConfig;
use crate::core::types::FactionId;
use crate::world::WorldView;

/// Balances of one faction against another, each in `[-boundary, boundary]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionBalance {
    pub wealth: f64,
    pub power: f64,
    pub terrain: f64,
}

impl FactionBalance {
    pub fn overall(&self) -> f64 {
        (self.wealth + self.power + self.terrain) / 3.0
    }
}

/// Map a raw ours/theirs ratio onto the symmetric linear range
pub fn rescale_ratio(ratio: f64, config: &BalanceConfig) -> f64 {
    let trim = config.trim_factor;
    let clamped = ratio.clamp(1.0 / trim, trim);
    if clamped >= 1.0 {
        (clamped - 1.0) / (trim - 1.0) * config.linear_boundary
    } else {
        -(1.0 / clamped - 1.0) / (trim - 1.0) * config.linear_boundary
    }
}

/// Balance of two non-negative amounts; an empty side counts as the extreme
pub fn balance_of(ours: f64, theirs: f64, config: &BalanceConfig) -> f64 {
    let ratio = match (ours > 0.0, theirs > 0.0) {
        (false, false) => 1.0,
        (true, false) => config.trim_factor,
        (false, true) => 1.0 / config.trim_factor,
        (true, true) => ours / theirs,
    };
    rescale_ratio(ratio, config)
}

fn wealth(world: &dyn WorldView, faction: FactionId, config: &BalanceConfig) -> f64 {
    let stats = world.faction_stats(faction);
    stats.gold * config.gold_weight + stats.inventory_value * config.inventory_weight
}

fn terrain(world: &dyn WorldView, faction: FactionId, config: &BalanceConfig) -> f64 {
    let stats = world.faction_stats(faction);
    stats.territory * config.territory_weight + stats.settlements as f64 * config.settlement_weight
}

/// Summed health of the faction's armed ships
fn military(world: &dyn WorldView, faction: FactionId) -> f64 {
    world
        .units_of(faction)
        .into_iter()
        .filter_map(|id| world.unit(id))
        .filter(|u| !u.kind.is_worker())
        .map(|u| u.health)
        .sum()
}

pub fn wealth_balance(world: &dyn WorldView, ours: FactionId, theirs: FactionId, config: &BalanceConfig) -> f64 {
    balance_of(wealth(world, ours, config), wealth(world, theirs, config), config)
}

pub fn power_balance(world: &dyn WorldView, ours: FactionId, theirs: FactionId, config: &BalanceConfig) -> f64 {
    balance_of(military(world, ours), military(world, theirs), config)
}

pub fn terrain_balance(world: &dyn WorldView, ours: FactionId, theirs: FactionId, config: &BalanceConfig) -> f64 {
    balance_of(terrain(world, ours, config), terrain(world, theirs, config), config)
}

pub fn faction_balance(
    world: &dyn WorldView,
    ours: FactionId,
    theirs: FactionId,
    config: &BalanceConfig,
) -> FactionBalance {
    FactionBalance {
        wealth: wealth_balance(world, ours, theirs, config),
        power: power_balance(world, ours, theirs, config),
        terrain: terrain_balance(world, ours, theirs, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point;
    use crate::sandbox::SandboxWorld;
    use crate::world::{FactionStats, UnitKind};

    fn config() -> BalanceConfig {
        BalanceConfig {
            trim_factor: 4.0,
            linear_boundary: 9.0,
            ..BalanceConfig::default()
        }
    }

    #[test]
    fn test_parity_is_zero() {
        assert_eq!(rescale_ratio(1.0, &config()), 0.0);
    }

    #[test]
    fn test_inverse_ratios_are_symmetric() {
        let c = config();
        assert!((rescale_ratio(2.0, &c) + rescale_ratio(0.5, &c)).abs() < 1e-12);
        assert!((rescale_ratio(2.0, &c) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_are_clamped() {
        let c = config();
        assert_eq!(rescale_ratio(100.0, &c), 9.0);
        assert_eq!(rescale_ratio(0.001, &c), -9.0);
    }

    #[test]
    fn test_empty_sides() {
        let c = config();
        assert_eq!(balance_of(0.0, 0.0, &c), 0.0);
        assert_eq!(balance_of(5.0, 0.0, &c), 9.0);
        assert_eq!(balance_of(0.0, 5.0, &c), -9.0);
    }

    #[test]
    fn test_faction_balance_from_world() {
        let mut world = SandboxWorld::new(50.0, 50.0);
        let (a, b) = (FactionId(1), FactionId(2));
        world.add_faction(a, false, Point::new(0.0, 0.0));
        world.add_faction(b, false, Point::new(40.0, 40.0));
        world.spawn_unit(a, UnitKind::Frigate, Point::new(1.0, 1.0), 100.0);
        world.spawn_unit(a, UnitKind::Frigate, Point::new(2.0, 1.0), 100.0);
        world.spawn_unit(b, UnitKind::Frigate, Point::new(40.0, 39.0), 100.0);
        world.spawn_unit(b, UnitKind::Trader, Point::new(40.0, 38.0), 500.0);
        world.set_stats(a, FactionStats { gold: 100.0, ..FactionStats::default() });
        world.set_stats(b, FactionStats { gold: 100.0, ..FactionStats::default() });

        let balance = faction_balance(&world, a, b, &config());
        assert!((balance.power - 3.0).abs() < 1e-12, "traders are not military");
        assert_eq!(balance.wealth, 0.0);
        assert_eq!(balance.terrain, 0.0);
    }
}
