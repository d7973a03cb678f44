//! Certainty functions
//!
//! A certainty scales a component's profile weight for one situation. The
//! result must be a finite, non-negative number; it may exceed 1.

use crate::behavior::{Environment, Situation};
use crate::geometry::dispersion;

pub trait CertaintyFn {
    fn certainty(&self, env: &Environment<'_>) -> f64;
}

/// Same value in every situation
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub f64);

impl CertaintyFn for Constant {
    fn certainty(&self, _env: &Environment<'_>) -> f64 {
        self.0
    }
}

/// `power_balance²` of a combat situation
#[derive(Debug, Clone, Copy)]
pub struct PowerBalanceSquared;

impl CertaintyFn for PowerBalanceSquared {
    fn certainty(&self, env: &Environment<'_>) -> f64 {
        let balance = env.combat().power_balance;
        balance * balance
    }
}

/// `1 / power_balance` of a combat situation
///
/// Not clamped: a hopeless fight yields values far above 1.
#[derive(Debug, Clone, Copy)]
pub struct InversePowerBalance;

impl CertaintyFn for InversePowerBalance {
    fn certainty(&self, env: &Environment<'_>) -> f64 {
        1.0 / env.combat().power_balance
    }
}

/// Zero when already at war with the opponent, otherwise the inner value
pub struct UnlessAtWar(pub Box<dyn CertaintyFn>);

impl CertaintyFn for UnlessAtWar {
    fn certainty(&self, env: &Environment<'_>) -> f64 {
        match env.opponent() {
            Some(other) if env.world.are_enemies(env.faction, other) => 0.0,
            _ => self.0.certainty(env),
        }
    }
}

/// Zero unless already at war with the opponent
pub struct OnlyAtWar(pub Box<dyn CertaintyFn>);

impl CertaintyFn for OnlyAtWar {
    fn certainty(&self, env: &Environment<'_>) -> f64 {
        match env.opponent() {
            Some(other) if env.world.are_enemies(env.faction, other) => self.0.certainty(env),
            _ => 0.0,
        }
    }
}

/// 1 when the prospective group has several ships close together, else 0
#[derive(Debug, Clone, Copy)]
pub struct FleetCohesion {
    pub max_dispersion: f64,
}

impl CertaintyFn for FleetCohesion {
    fn certainty(&self, env: &Environment<'_>) -> f64 {
        let group = match env.situation {
            Situation::Idle(idle) => &idle.companions,
            Situation::Combat(combat) => &combat.ship_group,
            Situation::Strategy(strategy) => &strategy.idle_ships,
            Situation::Diplomacy(_) => return 0.0,
        };
        if group.len() < 2 {
            return 0.0;
        }
        let positions: Vec<_> = group
            .iter()
            .filter_map(|id| env.world.unit(*id).map(|u| u.position))
            .collect();
        if positions.len() >= 2 && dispersion(&positions) <= self.max_dispersion {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{CombatSituation, IdleSituation, SituationKind};
    use crate::core::config::AiConfig;
    use crate::core::types::{FactionId, Point, UnitId};
    use crate::sandbox::SandboxWorld;
    use crate::world::{Relation, UnitKind};

    const US: FactionId = FactionId(1);
    const THEM: FactionId = FactionId(2);

    fn world() -> (SandboxWorld, UnitId, UnitId) {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(US, false, Point::new(0.0, 0.0));
        world.add_faction(THEM, false, Point::new(90.0, 90.0));
        let ours = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let theirs = world.spawn_unit(THEM, UnitKind::Frigate, Point::new(12.0, 10.0), 100.0);
        (world, ours, theirs)
    }

    fn combat(ours: UnitId, theirs: UnitId, balance: f64) -> Situation {
        Situation::Combat(CombatSituation {
            kind: SituationKind::FightingShipsInSight,
            ship_group: vec![ours],
            enemies: vec![theirs],
            power_balance: balance,
            mission: None,
        })
    }

    #[test]
    fn test_power_balance_functions() {
        let (world, ours, theirs) = world();
        let config = AiConfig::default();
        let situation = combat(ours, theirs, 0.5);
        let env = Environment::new(US, &world, &config, &situation);

        assert_eq!(PowerBalanceSquared.certainty(&env), 0.25);
        assert_eq!(InversePowerBalance.certainty(&env), 2.0);
    }

    #[test]
    fn test_war_gates() {
        let (mut world, ours, theirs) = world();
        let config = AiConfig::default();
        let situation = combat(ours, theirs, 1.0);

        {
            let env = Environment::new(US, &world, &config, &situation);
            assert_eq!(UnlessAtWar(Box::new(Constant(1.0))).certainty(&env), 1.0);
            assert_eq!(OnlyAtWar(Box::new(Constant(1.0))).certainty(&env), 0.0);
        }

        world.set_relation(US, THEM, Relation::Enemy);
        let env = Environment::new(US, &world, &config, &situation);
        assert_eq!(UnlessAtWar(Box::new(Constant(1.0))).certainty(&env), 0.0);
        assert_eq!(OnlyAtWar(Box::new(Constant(0.7))).certainty(&env), 0.7);
    }

    #[test]
    fn test_fleet_cohesion() {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(US, false, Point::new(0.0, 0.0));
        let a = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let b = world.spawn_unit(US, UnitKind::Frigate, Point::new(13.0, 14.0), 100.0);
        let far = world.spawn_unit(US, UnitKind::Frigate, Point::new(80.0, 80.0), 100.0);
        let config = AiConfig::default();
        let gate = FleetCohesion { max_dispersion: 10.0 };

        let alone = Situation::Idle(IdleSituation { ship_group: vec![a], companions: vec![a] });
        assert_eq!(gate.certainty(&Environment::new(US, &world, &config, &alone)), 0.0);

        let close = Situation::Idle(IdleSituation { ship_group: vec![a], companions: vec![a, b] });
        assert_eq!(gate.certainty(&Environment::new(US, &world, &config, &close)), 1.0);

        let spread = Situation::Idle(IdleSituation { ship_group: vec![a], companions: vec![a, far] });
        assert_eq!(gate.certainty(&Environment::new(US, &world, &config, &spread)), 0.0);
    }
}
