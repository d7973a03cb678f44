//! Behavior components
//!
//! A component declares which situations it responds to, which certainty
//! function scales its weight in each of them, and what it wants done once
//! selected. Components never touch the world; they return a [`Decision`].

use ordered_float::OrderedFloat;
use rand::RngCore;

use crate::behavior::certainty::{
    CertaintyFn, Constant, FleetCohesion, InversePowerBalance, OnlyAtWar, PowerBalanceSquared,
    UnlessAtWar,
};
use crate::behavior::{Decision, Environment, SituationKind};
use crate::core::config::AiConfig;
use crate::core::types::{FactionId, Point, UnitId};
use crate::geometry::{centroid, closest_pairing};
use crate::mission::MissionPlan;
use crate::world::{Relation, WorldView};

/// Trait for a selectable response
pub trait Behavior {
    fn name(&self) -> &'static str;

    /// Situations this component has a handler for
    fn situations(&self) -> &'static [SituationKind];

    /// Certainty registered for `kind`; constant 1 unless overridden
    fn certainty(&self, _kind: SituationKind, _config: &AiConfig) -> Box<dyn CertaintyFn> {
        Box::new(Constant(1.0))
    }

    fn respond(&self, env: &Environment<'_>, rng: &mut dyn RngCore) -> Option<Decision>;
}

fn positions(world: &dyn WorldView, units: &[UnitId]) -> Vec<(UnitId, Point)> {
    units
        .iter()
        .filter_map(|id| world.unit(*id).map(|u| (*id, u.position)))
        .collect()
}

fn group_center(world: &dyn WorldView, units: &[UnitId]) -> Option<Point> {
    let points: Vec<Point> = positions(world, units).into_iter().map(|(_, p)| p).collect();
    centroid(&points)
}

fn pair_with_enemies(env: &Environment<'_>) -> Option<Vec<(UnitId, UnitId)>> {
    let combat = env.combat();
    let pairs = closest_pairing(
        &positions(env.world, &combat.ship_group),
        &positions(env.world, &combat.enemies),
    );
    (!pairs.is_empty()).then_some(pairs)
}

/// Attacks pirates on sight
pub struct PirateHater;

impl Behavior for PirateHater {
    fn name(&self) -> &'static str {
        "pirate_hater"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::PirateShipsInSight]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        pair_with_enemies(env).map(|pairs| Decision::Attack { pairs })
    }
}

/// Attacks enemies it is at war with, keener the stronger it is
pub struct Aggressive;

impl Behavior for Aggressive {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[
            SituationKind::FightingShipsInSight,
            SituationKind::WorkingShipsInSight,
        ]
    }

    fn certainty(&self, kind: SituationKind, _config: &AiConfig) -> Box<dyn CertaintyFn> {
        match kind {
            SituationKind::FightingShipsInSight => Box::new(OnlyAtWar(Box::new(PowerBalanceSquared))),
            _ => Box::new(OnlyAtWar(Box::new(Constant(1.0)))),
        }
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        pair_with_enemies(env).map(|pairs| Decision::Attack { pairs })
    }
}

/// Runs home, keener the weaker it is
pub struct Coward;

impl Behavior for Coward {
    fn name(&self) -> &'static str {
        "coward"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[
            SituationKind::FightingShipsInSight,
            SituationKind::PirateShipsInSight,
        ]
    }

    fn certainty(&self, _kind: SituationKind, _config: &AiConfig) -> Box<dyn CertaintyFn> {
        Box::new(InversePowerBalance)
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let destination = env.home()?;
        Some(Decision::Flee {
            units: env.combat().ship_group.clone(),
            destination,
        })
    }
}

/// Declares war on whoever it meets, once
pub struct BreakDiplomacy;

impl Behavior for BreakDiplomacy {
    fn name(&self) -> &'static str {
        "break_diplomacy"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[
            SituationKind::FightingShipsInSight,
            SituationKind::WorkingShipsInSight,
        ]
    }

    fn certainty(&self, _kind: SituationKind, _config: &AiConfig) -> Box<dyn CertaintyFn> {
        Box::new(UnlessAtWar(Box::new(Constant(1.0))))
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        env.opponent().map(|target| Decision::DeclareWar { target })
    }
}

/// Stays the course
pub struct DoNothing;

impl Behavior for DoNothing {
    fn name(&self) -> &'static str {
        "do_nothing"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[
            SituationKind::FightingShipsInSight,
            SituationKind::PirateShipsInSight,
            SituationKind::WorkingShipsInSight,
            SituationKind::TradingShipsInSight,
            SituationKind::NoOneInSight,
        ]
    }

    fn respond(&self, _env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        None
    }
}

/// Gathers nearby idle ships into a patrol towards a random point
pub struct FleetPatrol;

impl Behavior for FleetPatrol {
    fn name(&self) -> &'static str {
        "fleet_patrol"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::NoOneInSight]
    }

    fn certainty(&self, _kind: SituationKind, config: &AiConfig) -> Box<dyn CertaintyFn> {
        Box::new(FleetCohesion {
            max_dispersion: config.behavior.fleet_max_dispersion,
        })
    }

    fn respond(&self, env: &Environment<'_>, rng: &mut dyn RngCore) -> Option<Decision> {
        let destination = env.world.random_reachable_position(rng)?;
        Some(Decision::Patrol {
            units: env.idle().companions.clone(),
            destination,
        })
    }
}

/// Pirate: go after merchant and fishing ships
pub struct PirateRaider;

impl Behavior for PirateRaider {
    fn name(&self) -> &'static str {
        "pirate_raider"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::TradingShipsInSight]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        pair_with_enemies(env).map(|pairs| Decision::Chase { pairs })
    }
}

/// Pirate: drift back to the base when nothing is around
pub struct PirateRoutine;

impl Behavior for PirateRoutine {
    fn name(&self) -> &'static str {
        "pirate_routine"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::NoOneInSight]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let home = env.home()?;
        let units: Vec<UnitId> = positions(env.world, &env.idle().ship_group)
            .into_iter()
            .filter(|(_, p)| p.distance(&home) > env.config.combat.home_radius)
            .map(|(id, _)| id)
            .collect();
        (!units.is_empty()).then_some(Decision::ReturnHome { units, home })
    }
}

/// Mission choice for regular factions
pub struct StrategyRegular;

impl StrategyRegular {
    fn nearest_hostile_ship(
        env: &Environment<'_>,
        from: Point,
        targets: &[FactionId],
    ) -> Option<(FactionId, UnitId)> {
        targets
            .iter()
            .flat_map(|faction| {
                env.world
                    .units_of(*faction)
                    .into_iter()
                    .filter_map(|id| env.world.unit(id))
                    .filter(|u| u.selectable && !u.kind.is_worker())
                    .map(move |u| (*faction, u))
            })
            .min_by_key(|(_, u)| OrderedFloat(u.position.distance(&from)))
            .map(|(faction, u)| (faction, u.id))
    }

    fn nearest_settlement(
        env: &Environment<'_>,
        from: Point,
        targets: &[FactionId],
    ) -> Option<(FactionId, Point)> {
        targets
            .iter()
            .flat_map(|faction| {
                env.world
                    .settlement_positions(*faction)
                    .into_iter()
                    .map(move |p| (*faction, p))
            })
            .min_by_key(|(_, p)| OrderedFloat(p.distance(&from)))
    }
}

impl Behavior for StrategyRegular {
    fn name(&self) -> &'static str {
        "strategy_regular"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[
            SituationKind::HostilePlayer,
            SituationKind::PlayerSharesIsland,
            SituationKind::NeutralPlayer,
        ]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let strategy = env.strategy();
        if strategy.idle_ships.is_empty() {
            return None;
        }
        let ships = strategy.idle_ships.clone();
        let from = group_center(env.world, &ships)?;

        let plan = match strategy.kind {
            SituationKind::HostilePlayer => {
                let (enemy, target) = Self::nearest_hostile_ship(env, from, &strategy.targets)?;
                MissionPlan::ChaseShipsAndAttack {
                    ships,
                    enemy,
                    target,
                }
            }
            SituationKind::PlayerSharesIsland => {
                let (enemy, target) = Self::nearest_settlement(env, from, &strategy.targets)?;
                MissionPlan::SurpriseAttack {
                    ships,
                    enemy,
                    target,
                }
            }
            SituationKind::NeutralPlayer => MissionPlan::Scouting {
                ships,
                target: Self::nearest_settlement(env, from, &strategy.targets).map(|(_, p)| p),
            },
            _ => return None,
        };
        Some(Decision::StartMission(plan))
    }
}

/// Mission choice for the pirates
pub struct StrategyPirate;

impl Behavior for StrategyPirate {
    fn name(&self) -> &'static str {
        "strategy_pirate"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::PirateRoutine]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let ships = env.strategy().idle_ships.clone();
        (!ships.is_empty()).then_some(Decision::StartMission(MissionPlan::PirateRoutine { ships }))
    }
}

/// Makes peace with stronger enemies and allies with equals
pub struct DiplomacyPeaceful;

impl Behavior for DiplomacyPeaceful {
    fn name(&self) -> &'static str {
        "diplomacy_peaceful"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::HostilePlayer, SituationKind::NeutralPlayer]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let diplomacy = env.diplomacy();
        let thresholds = &env.config.diplomacy;
        let relation = match diplomacy.kind {
            SituationKind::HostilePlayer if diplomacy.balance.power <= thresholds.peace_threshold => {
                Relation::Neutral
            }
            SituationKind::NeutralPlayer
                if diplomacy.balance.overall().abs() <= thresholds.alliance_band =>
            {
                Relation::Allied
            }
            _ => return None,
        };
        Some(Decision::ChangeRelation {
            target: diplomacy.target,
            relation,
        })
    }
}

/// Turns on weaker neighbours
pub struct DiplomacyWarlike;

impl Behavior for DiplomacyWarlike {
    fn name(&self) -> &'static str {
        "diplomacy_warlike"
    }

    fn situations(&self) -> &'static [SituationKind] {
        &[SituationKind::NeutralPlayer, SituationKind::AlliedPlayer]
    }

    fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        let diplomacy = env.diplomacy();
        if diplomacy.balance.power < env.config.diplomacy.war_threshold {
            return None;
        }
        let relation = match diplomacy.kind {
            SituationKind::NeutralPlayer => Relation::Enemy,
            SituationKind::AlliedPlayer => Relation::Neutral,
            _ => return None,
        };
        Some(Decision::ChangeRelation {
            target: diplomacy.target,
            relation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{CombatSituation, DiplomacySituation, IdleSituation, Situation, StrategySituation};
    use crate::sandbox::SandboxWorld;
    use crate::strategy::balance::FactionBalance;
    use crate::world::UnitKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const US: FactionId = FactionId(1);
    const THEM: FactionId = FactionId(2);

    fn world() -> SandboxWorld {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(US, false, Point::new(0.0, 0.0));
        world.add_faction(THEM, false, Point::new(90.0, 90.0));
        world.add_settlement(THEM, Point::new(80.0, 80.0));
        world
    }

    #[test]
    fn test_attack_pairs_each_ship_with_nearest_enemy() {
        let mut world = world();
        let a = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let b = world.spawn_unit(US, UnitKind::Frigate, Point::new(30.0, 10.0), 100.0);
        let near_a = world.spawn_unit(THEM, UnitKind::Frigate, Point::new(12.0, 10.0), 100.0);
        let near_b = world.spawn_unit(THEM, UnitKind::Frigate, Point::new(28.0, 10.0), 100.0);
        let config = AiConfig::default();
        let situation = Situation::Combat(CombatSituation {
            kind: SituationKind::FightingShipsInSight,
            ship_group: vec![a, b],
            enemies: vec![near_a, near_b],
            power_balance: 1.0,
            mission: None,
        });
        let env = Environment::new(US, &world, &config, &situation);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(
            Aggressive.respond(&env, &mut rng),
            Some(Decision::Attack { pairs: vec![(a, near_a), (b, near_b)] })
        );
    }

    #[test]
    fn test_coward_flees_home() {
        let mut world = world();
        let a = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let e = world.spawn_unit(THEM, UnitKind::Frigate, Point::new(12.0, 10.0), 100.0);
        let config = AiConfig::default();
        let situation = Situation::Combat(CombatSituation {
            kind: SituationKind::FightingShipsInSight,
            ship_group: vec![a],
            enemies: vec![e],
            power_balance: 0.5,
            mission: None,
        });
        let env = Environment::new(US, &world, &config, &situation);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(
            Coward.respond(&env, &mut rng),
            Some(Decision::Flee { units: vec![a], destination: Point::new(0.0, 0.0) })
        );
    }

    #[test]
    fn test_pirate_routine_only_returns_distant_ships() {
        let mut world = world();
        let close = world.spawn_unit(US, UnitKind::PirateShip, Point::new(2.0, 2.0), 100.0);
        let far = world.spawn_unit(US, UnitKind::PirateShip, Point::new(50.0, 50.0), 100.0);
        let config = AiConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let near_home = Situation::Idle(IdleSituation { ship_group: vec![close], companions: vec![close] });
        assert_eq!(PirateRoutine.respond(&Environment::new(US, &world, &config, &near_home), &mut rng), None);

        let away = Situation::Idle(IdleSituation { ship_group: vec![far], companions: vec![far] });
        assert_eq!(
            PirateRoutine.respond(&Environment::new(US, &world, &config, &away), &mut rng),
            Some(Decision::ReturnHome { units: vec![far], home: Point::new(0.0, 0.0) })
        );
    }

    #[test]
    fn test_strategy_regular_plans() {
        let mut world = world();
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let enemy = world.spawn_unit(THEM, UnitKind::Frigate, Point::new(60.0, 60.0), 100.0);
        let config = AiConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let hostile = Situation::Strategy(StrategySituation {
            kind: SituationKind::HostilePlayer,
            targets: vec![THEM],
            idle_ships: vec![ship],
        });
        assert_eq!(
            StrategyRegular.respond(&Environment::new(US, &world, &config, &hostile), &mut rng),
            Some(Decision::StartMission(MissionPlan::ChaseShipsAndAttack {
                ships: vec![ship],
                enemy: THEM,
                target: enemy,
            }))
        );

        let island = Situation::Strategy(StrategySituation {
            kind: SituationKind::PlayerSharesIsland,
            targets: vec![THEM],
            idle_ships: vec![ship],
        });
        assert_eq!(
            StrategyRegular.respond(&Environment::new(US, &world, &config, &island), &mut rng),
            Some(Decision::StartMission(MissionPlan::SurpriseAttack {
                ships: vec![ship],
                enemy: THEM,
                target: Point::new(80.0, 80.0),
            }))
        );
    }

    #[test]
    fn test_diplomacy_thresholds() {
        let world = world();
        let config = AiConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let strong = FactionBalance { wealth: 0.0, power: 6.0, terrain: 0.0 };
        let even = FactionBalance { wealth: 0.0, power: 0.0, terrain: 0.0 };

        let neutral_strong = Situation::Diplomacy(DiplomacySituation {
            kind: SituationKind::NeutralPlayer,
            target: THEM,
            relation: Relation::Neutral,
            balance: strong,
        });
        let env = Environment::new(US, &world, &config, &neutral_strong);
        assert_eq!(
            DiplomacyWarlike.respond(&env, &mut rng),
            Some(Decision::ChangeRelation { target: THEM, relation: Relation::Enemy })
        );
        assert_eq!(DiplomacyPeaceful.respond(&env, &mut rng), None);

        let neutral_even = Situation::Diplomacy(DiplomacySituation {
            kind: SituationKind::NeutralPlayer,
            target: THEM,
            relation: Relation::Neutral,
            balance: even,
        });
        let env = Environment::new(US, &world, &config, &neutral_even);
        assert_eq!(DiplomacyWarlike.respond(&env, &mut rng), None);
        assert_eq!(
            DiplomacyPeaceful.respond(&env, &mut rng),
            Some(Decision::ChangeRelation { target: THEM, relation: Relation::Allied })
        );
    }
}
