//! Strategy layer
//!
//! Periodically turns the strongest firing condition into a mission and
//! reviews relations with the other factions.

pub mod balance;
pub mod condition;

pub use balance::{faction_balance, FactionBalance};
pub use condition::{ConditionKind, ConditionResult};

use std::collections::BTreeMap;

use ahash::AHashMap;
use tracing::{debug, info};

use crate::behavior::{
    Category, Decision, DiplomacySituation, Environment, Situation, SituationKind,
    StrategyBucket, StrategySituation,
};
use crate::combat::CombatState;
use crate::core::types::{FactionId, MissionId, UnitId};
use crate::faction::{FactionCore, FinishedMission};
use crate::fleet::{filter_units, UnitFilter};
use crate::mission::Mission;
use crate::world::{Relation, TickContext};

/// The condition that won a strategy pass
struct Pick {
    condition: ConditionKind,
    target: Option<FactionId>,
    result: ConditionResult,
    score: f64,
}

/// Priority × certainty of a firing condition
///
/// # Panics
/// If the certainty is negative or not finite.
fn condition_score(condition: ConditionKind, priority: f64, certainty: f64) -> f64 {
    assert!(
        certainty.is_finite() && certainty >= 0.0,
        "{} returned certainty {}",
        condition,
        certainty
    );
    priority * certainty
}

#[derive(Debug, Default)]
pub struct StrategyManager {
    /// (condition, target faction) → mission started for it
    locks: AHashMap<(ConditionKind, FactionId), MissionId>,
}

impl StrategyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, condition: ConditionKind, target: FactionId) -> bool {
        self.locks.contains_key(&(condition, target))
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Only phases with combat handlers may be interrupted
    pub fn request_to_pause_mission(&self, mission: &Mission) -> bool {
        mission.can_pause()
    }

    /// Drop every lock held by a mission that just ended
    pub fn release_locks(&mut self, finished: &[FinishedMission]) {
        for done in finished {
            let before = self.locks.len();
            self.locks.retain(|_, mission| *mission != done.id);
            if self.locks.len() != before {
                info!(mission = %done.id, success = done.success, "condition lock released");
            }
        }
    }

    /// Idle, fleet-free ships a new mission may take
    fn idle_ships(
        core: &FactionCore,
        states: &BTreeMap<UnitId, CombatState>,
        ctx: &TickContext<'_>,
    ) -> Vec<UnitId> {
        let own = core.units.units_of_faction(ctx.world);
        filter_units(
            &own,
            &[
                UnitFilter::OfKind(core.policy.fighter_kinds),
                UnitFilter::Selectable,
                UnitFilter::NotInFleet(&core.units),
                UnitFilter::InState {
                    states,
                    allowed: core.policy.idle_states,
                },
            ],
            ctx.world,
        )
    }

    /// Highest priority × certainty; the first one seen wins ties
    fn best_condition(&self, core: &FactionCore, ctx: &TickContext<'_>) -> Option<Pick> {
        let me = core.faction;
        let others: Vec<FactionId> = ctx
            .world
            .factions()
            .into_iter()
            .filter(|f| *f != me)
            .collect();

        let mut candidates: Vec<(ConditionKind, Option<FactionId>)> = core
            .policy
            .conditions
            .iter()
            .filter(|c| !c.per_faction())
            .map(|c| (*c, None))
            .collect();
        for other in &others {
            for condition in core.policy.conditions.iter().filter(|c| c.per_faction()) {
                if !self.is_locked(*condition, *other) {
                    candidates.push((*condition, Some(*other)));
                }
            }
        }

        let mut best: Option<Pick> = None;
        for (condition, target) in candidates {
            let Some(result) = condition.evaluate(me, target, ctx.world, &core.config) else {
                continue;
            };
            let priority = condition.priority(&core.config.strategy);
            let score = condition_score(condition, priority, result.certainty);
            debug!(faction = %me, %condition, target = ?target, score, "condition fired");
            if score <= 0.0 {
                continue;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Pick {
                    condition,
                    target,
                    result,
                    score,
                });
            }
        }
        best
    }

    /// One strategy pass: maybe start one mission
    pub(crate) fn handle_strategy(
        &mut self,
        core: &mut FactionCore,
        states: &BTreeMap<UnitId, CombatState>,
        ctx: &mut TickContext<'_>,
    ) -> Option<MissionId> {
        let idle_ships = Self::idle_ships(core, states, ctx);
        if idle_ships.is_empty() {
            debug!(faction = %core.faction, "no idle ships for strategy");
            return None;
        }
        let pick = self.best_condition(core, ctx)?;

        let situation = Situation::Strategy(StrategySituation {
            kind: pick.result.situation,
            targets: pick.result.targets,
            idle_ships,
        });
        let decision = {
            let env = Environment::new(core.faction, ctx.world, &core.config, &situation);
            core.behavior
                .select(Category::Strategy(pick.result.bucket), &env, &mut core.rng)
        };

        let plan = match decision {
            Some(Decision::StartMission(plan)) => plan,
            Some(other) => {
                debug!(faction = %core.faction, ?other, "strategy decision is not a mission");
                return None;
            }
            None => return None,
        };
        let id = core.start_mission(plan, ctx);
        info!(
            faction = %core.faction,
            condition = %pick.condition,
            target = ?pick.target,
            mission = %id,
            "strategy started mission"
        );
        if let (true, Some(target)) = (pick.condition.lockable(), pick.target) {
            self.locks.insert((pick.condition, target), id);
        }
        Some(id)
    }

    /// Review relations with every other regular faction
    pub(crate) fn handle_diplomacy(&self, core: &mut FactionCore, ctx: &mut TickContext<'_>) {
        if core.policy.pirate {
            return;
        }
        let me = core.faction;
        for other in ctx.world.factions() {
            if other == me || ctx.world.is_pirate_faction(other) {
                continue;
            }
            let relation = ctx.world.relation(me, other);
            let kind = match relation {
                Relation::Enemy => SituationKind::HostilePlayer,
                Relation::Neutral => SituationKind::NeutralPlayer,
                Relation::Allied => SituationKind::AlliedPlayer,
            };
            let situation = Situation::Diplomacy(DiplomacySituation {
                kind,
                target: other,
                relation,
                balance: faction_balance(ctx.world, me, other, &core.config.balance),
            });
            let decision = {
                let env = Environment::new(me, ctx.world, &core.config, &situation);
                core.behavior.select(
                    Category::Strategy(StrategyBucket::Diplomatic),
                    &env,
                    &mut core.rng,
                )
            };
            if let Some(Decision::ChangeRelation { target, relation: next }) = decision {
                info!(faction = %me, %target, from = ?relation, to = ?next, "relation changed");
                ctx.commands.set_relation(me, target, next);
            }
        }
    }
}
