//! Strategy conditions
//!
//! A condition looks at the world from one faction's point of view and,
//! when it fires, names the strategy situation to hand to the behavior
//! manager along with a certainty in `[0, 1]`.

use crate::behavior::{SituationKind, StrategyBucket};
use crate::core::config::{AiConfig, BalanceConfig, StrategyConfig};
use crate::core::types::FactionId;
use crate::strategy::balance::{power_balance, terrain_balance};
use crate::world::WorldView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Another faction settled on one of our islands
    SharingIsland,
    /// A faction is at war with us
    Hostile,
    Neutral,
    /// Pirates with idle ships always have their routine
    PirateRoutinePossible,
}

/// A fired condition
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionResult {
    pub situation: SituationKind,
    pub bucket: StrategyBucket,
    pub targets: Vec<FactionId>,
    pub certainty: f64,
}

/// Map a balance in `[-boundary, boundary]` onto `[0, 1]`
fn normalized(balance: f64, config: &BalanceConfig) -> f64 {
    let boundary = config.linear_boundary;
    ((balance + boundary) / (2.0 * boundary)).clamp(0.0, 1.0)
}

impl ConditionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConditionKind::SharingIsland => "sharing_island",
            ConditionKind::Hostile => "hostile",
            ConditionKind::Neutral => "neutral",
            ConditionKind::PirateRoutinePossible => "pirate_routine_possible",
        }
    }

    /// Lockable conditions stay quiet against a faction while the mission
    /// they started is running
    pub fn lockable(&self) -> bool {
        !matches!(self, ConditionKind::PirateRoutinePossible)
    }

    /// Evaluated once per other faction rather than once per pass
    pub fn per_faction(&self) -> bool {
        !matches!(self, ConditionKind::PirateRoutinePossible)
    }

    pub fn priority(&self, config: &StrategyConfig) -> f64 {
        match self {
            ConditionKind::SharingIsland => config.sharing_island_priority,
            ConditionKind::Hostile => config.hostile_priority,
            ConditionKind::Neutral => config.neutral_priority,
            ConditionKind::PirateRoutinePossible => config.pirate_routine_priority,
        }
    }

    /// `other` is `None` exactly for conditions that are not per faction
    pub fn evaluate(
        &self,
        me: FactionId,
        other: Option<FactionId>,
        world: &dyn WorldView,
        config: &AiConfig,
    ) -> Option<ConditionResult> {
        match (self, other) {
            (ConditionKind::PirateRoutinePossible, _) => {
                world.is_pirate_faction(me).then(|| ConditionResult {
                    situation: SituationKind::PirateRoutine,
                    bucket: StrategyBucket::Offensive,
                    targets: Vec::new(),
                    certainty: 1.0,
                })
            }
            (_, None) => None,
            (_, Some(other)) if other == me || world.is_pirate_faction(other) => None,
            (ConditionKind::SharingIsland, Some(other)) => {
                if world.are_allies(me, other) {
                    return None;
                }
                let ours = world.faction_islands(me);
                let shared = world
                    .faction_islands(other)
                    .iter()
                    .any(|island| ours.contains(island));
                shared.then(|| ConditionResult {
                    situation: SituationKind::PlayerSharesIsland,
                    bucket: StrategyBucket::Offensive,
                    targets: vec![other],
                    certainty: normalized(terrain_balance(world, me, other, &config.balance), &config.balance),
                })
            }
            (ConditionKind::Hostile, Some(other)) => {
                world.are_enemies(me, other).then(|| ConditionResult {
                    situation: SituationKind::HostilePlayer,
                    bucket: StrategyBucket::Offensive,
                    targets: vec![other],
                    certainty: normalized(power_balance(world, me, other, &config.balance), &config.balance),
                })
            }
            (ConditionKind::Neutral, Some(other)) => {
                world.are_neutral(me, other).then(|| ConditionResult {
                    situation: SituationKind::NeutralPlayer,
                    bucket: StrategyBucket::Offensive,
                    targets: vec![other],
                    certainty: 1.0,
                })
            }
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point;
    use crate::sandbox::SandboxWorld;
    use crate::world::{IslandId, Relation, UnitKind};

    const US: FactionId = FactionId(1);
    const THEM: FactionId = FactionId(2);
    const PIRATES: FactionId = FactionId(9);

    fn world() -> SandboxWorld {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(US, false, Point::new(10.0, 10.0));
        world.add_faction(THEM, false, Point::new(90.0, 90.0));
        world.add_faction(PIRATES, true, Point::new(50.0, 90.0));
        world
    }

    #[test]
    fn test_sharing_island_fires_on_common_island() {
        let mut world = world();
        let config = AiConfig::default();
        world.set_islands(US, vec![IslandId(1), IslandId(2)]);
        world.set_islands(THEM, vec![IslandId(3)]);
        assert!(ConditionKind::SharingIsland
            .evaluate(US, Some(THEM), &world, &config)
            .is_none());

        world.set_islands(THEM, vec![IslandId(2)]);
        let result = ConditionKind::SharingIsland
            .evaluate(US, Some(THEM), &world, &config)
            .expect("fires");
        assert_eq!(result.situation, SituationKind::PlayerSharesIsland);
        assert_eq!(result.targets, vec![THEM]);
        // Equal terrain: parity
        assert!((result.certainty - 0.5).abs() < 1e-9);

        world.set_relation(US, THEM, Relation::Allied);
        assert!(ConditionKind::SharingIsland
            .evaluate(US, Some(THEM), &world, &config)
            .is_none());
    }

    #[test]
    fn test_hostile_certainty_follows_power() {
        let mut world = world();
        let config = AiConfig::default();
        world.set_relation(US, THEM, Relation::Enemy);
        world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 400.0);
        world.spawn_unit(THEM, UnitKind::Frigate, Point::new(90.0, 90.0), 100.0);

        let result = ConditionKind::Hostile
            .evaluate(US, Some(THEM), &world, &config)
            .expect("at war");
        // Ratio 4 hits the trim factor: full certainty
        assert!((result.certainty - 1.0).abs() < 1e-9);
        assert!(ConditionKind::Neutral.evaluate(US, Some(THEM), &world, &config).is_none());
    }

    #[test]
    fn test_pirates_are_never_targets() {
        let world = world();
        let config = AiConfig::default();
        for condition in [ConditionKind::SharingIsland, ConditionKind::Hostile, ConditionKind::Neutral] {
            assert!(condition.evaluate(US, Some(PIRATES), &world, &config).is_none());
        }
    }

    #[test]
    fn test_pirate_routine_only_for_pirates() {
        let world = world();
        let config = AiConfig::default();
        let condition = ConditionKind::PirateRoutinePossible;
        assert!(!condition.lockable());
        assert!(condition.evaluate(US, None, &world, &config).is_none());
        let result = condition.evaluate(PIRATES, None, &world, &config).expect("pirate");
        assert_eq!(result.situation, SituationKind::PirateRoutine);
    }
}
