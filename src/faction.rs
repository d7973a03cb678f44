//! Per-faction AI
//!
//! `FactionAi` owns everything one faction's AI needs: its RNG, fleets,
//! missions, behavior manager, scheduler, lookout and strategy. The
//! simulation feeds it world events and calls [`FactionAi::tick`] once per
//! tick, in a fixed faction order.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::behavior::{BehaviorManager, BehaviorProfile};
use crate::combat::{CombatManager, CombatState, FactionPolicy};
use crate::core::config::AiConfig;
use crate::core::error::Result;
use crate::core::types::{FactionId, MissionId, UnitId};
use crate::fleet::{FleetEvent, FleetOwner, UnitManager};
use crate::mission::{validate_tables, Mission, MissionEnv, MissionPlan, MissionStep};
use crate::schedule::Scheduler;
use crate::strategy::StrategyManager;
use crate::world::{TickContext, WorldEvent};

/// A mission that reported success or failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedMission {
    pub id: MissionId,
    pub kind: String,
    pub success: bool,
    pub message: String,
}

/// Lifecycle calls routed to a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissionOp<'r> {
    Start,
    Pause,
    Continue,
    Abort(&'r str),
    Arrived,
    AllShipsLost,
}

/// State shared by the lookout and the strategy layer
pub(crate) struct FactionCore {
    pub faction: FactionId,
    pub policy: FactionPolicy,
    pub config: AiConfig,
    pub rng: ChaCha8Rng,
    pub units: UnitManager,
    pub missions: BTreeMap<MissionId, Mission>,
    pub behavior: BehaviorManager,
    pub scheduler: Scheduler,
    next_mission: u32,
    finished: Vec<FinishedMission>,
}

impl FactionCore {
    /// Give the plan's ships a fleet and start the mission
    pub fn start_mission(&mut self, plan: MissionPlan, ctx: &mut TickContext<'_>) -> MissionId {
        let id = MissionId(self.next_mission);
        self.next_mission += 1;
        let mission = Mission::new(id, self.faction, plan, &mut self.units);
        self.missions.insert(id, mission);
        self.drive_mission(id, MissionOp::Start, ctx);
        id
    }

    /// Run one lifecycle call; a finished mission is removed and its ships freed
    pub fn drive_mission(
        &mut self,
        id: MissionId,
        op: MissionOp<'_>,
        ctx: &mut TickContext<'_>,
    ) -> Option<MissionStep> {
        let FactionCore {
            config,
            rng,
            units,
            missions,
            scheduler,
            ..
        } = self;
        let mission = missions.get_mut(&id)?;
        let step = {
            let mut env = MissionEnv {
                ctx: &mut *ctx,
                units,
                scheduler,
                config: &*config,
                rng,
            };
            match op {
                MissionOp::Start => mission.start(&mut env),
                MissionOp::Pause => {
                    mission.pause(&mut env);
                    MissionStep::Continue
                }
                MissionOp::Continue => mission.continue_mission(&mut env),
                MissionOp::Abort(reason) => mission.abort(reason, &mut env),
                MissionOp::Arrived => mission.on_fleet_arrived(&mut env),
                MissionOp::AllShipsLost => mission.on_all_ships_lost(),
            }
        };
        if step.is_finished() {
            self.finish(id, &step, ctx);
        }
        Some(step)
    }

    fn finish(&mut self, id: MissionId, step: &MissionStep, ctx: &mut TickContext<'_>) {
        let Some(mission) = self.missions.remove(&id) else {
            return;
        };
        let freed = self
            .units
            .disband_fleet(mission.fleet(), ctx, &mut self.scheduler);
        let (success, message) = match step {
            MissionStep::Success(message) => (true, message.clone()),
            MissionStep::Failure(message) => (false, message.clone()),
            MissionStep::Continue => return,
        };
        info!(
            faction = %self.faction,
            mission = %id,
            kind = mission.name(),
            success,
            message = %message,
            freed = freed.len(),
            "mission finished"
        );
        self.finished.push(FinishedMission {
            id,
            kind: mission.name().to_string(),
            success,
            message,
        });
    }

    pub fn on_fleet_event(&mut self, event: FleetEvent, ctx: &mut TickContext<'_>) {
        match event {
            FleetEvent::Arrived {
                fleet,
                owner: FleetOwner::Patrol,
            } => {
                let freed = self.units.disband_fleet(fleet, ctx, &mut self.scheduler);
                debug!(faction = %self.faction, %fleet, ships = freed.len(), "patrol finished");
            }
            FleetEvent::Destroyed {
                fleet,
                owner: FleetOwner::Patrol,
            } => {
                debug!(faction = %self.faction, %fleet, "patrol lost");
            }
            FleetEvent::Arrived {
                owner: FleetOwner::Mission(id),
                ..
            } => {
                self.drive_mission(id, MissionOp::Arrived, ctx);
            }
            FleetEvent::Destroyed {
                owner: FleetOwner::Mission(id),
                ..
            } => {
                self.drive_mission(id, MissionOp::AllShipsLost, ctx);
            }
        }
    }

    fn take_finished(&mut self) -> Vec<FinishedMission> {
        std::mem::take(&mut self.finished)
    }
}

pub struct FactionAi {
    core: FactionCore,
    combat: CombatManager,
    strategy: StrategyManager,
    history: Vec<FinishedMission>,
}

impl FactionAi {
    /// Validate the configuration and draw a behavior profile from `seed`
    pub fn new(faction: FactionId, pirate: bool, seed: u64, config: AiConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let profile = BehaviorProfile::draw(pirate, &mut rng);
        Self::build(faction, pirate, rng, config, &profile)
    }

    /// Same as [`FactionAi::new`] with a fixed profile
    pub fn with_profile(
        faction: FactionId,
        pirate: bool,
        seed: u64,
        config: AiConfig,
        profile: &BehaviorProfile,
    ) -> Result<Self> {
        Self::build(faction, pirate, ChaCha8Rng::seed_from_u64(seed), config, profile)
    }

    fn build(
        faction: FactionId,
        pirate: bool,
        rng: ChaCha8Rng,
        config: AiConfig,
        profile: &BehaviorProfile,
    ) -> Result<Self> {
        config.validate()?;
        validate_tables()?;
        let behavior = BehaviorManager::from_profile(profile, &config);
        info!(%faction, pirate, profile = profile.name, "faction AI created");
        Ok(Self {
            core: FactionCore {
                faction,
                policy: FactionPolicy::for_faction(pirate),
                config,
                rng,
                units: UnitManager::new(faction),
                missions: BTreeMap::new(),
                behavior,
                scheduler: Scheduler::new(),
                next_mission: 0,
                finished: Vec::new(),
            },
            combat: CombatManager::new(),
            strategy: StrategyManager::new(),
            history: Vec::new(),
        })
    }

    pub fn faction(&self) -> FactionId {
        self.core.faction
    }

    pub fn is_pirate(&self) -> bool {
        self.core.policy.pirate
    }

    pub fn profile_name(&self) -> &'static str {
        self.core.behavior.profile()
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.core.missions.values()
    }

    pub fn mission(&self, id: MissionId) -> Option<&Mission> {
        self.core.missions.get(&id)
    }

    pub fn unit_manager(&self) -> &UnitManager {
        &self.core.units
    }

    pub fn combat_state(&self, unit: UnitId) -> CombatState {
        self.combat.state(unit)
    }

    /// Every mission that ended so far, oldest first
    pub fn finished_missions(&self) -> &[FinishedMission] {
        &self.history
    }

    pub fn lock_count(&self) -> usize {
        self.strategy.lock_count()
    }

    /// Route a world notification to the fleet or the lookout
    pub fn handle_event(&mut self, event: WorldEvent, ctx: &mut TickContext<'_>) {
        match event {
            WorldEvent::MoveFinished { unit, outcome } => {
                if self.core.units.fleet_of(unit).is_some() {
                    let fleet_event = self.core.units.on_move_finished(
                        unit,
                        outcome,
                        &self.core.config.fleet,
                        ctx,
                        &mut self.core.scheduler,
                    );
                    if let Some(fleet_event) = fleet_event {
                        self.core.on_fleet_event(fleet_event, ctx);
                    }
                } else {
                    self.combat.on_move_finished(&self.core, unit, outcome, ctx);
                }
            }
            WorldEvent::UnitRemoved { unit } => {
                self.combat.on_unit_removed(unit);
                if let Some(fleet_event) = self
                    .core
                    .units
                    .on_unit_removed(unit, &mut self.core.scheduler)
                {
                    self.core.on_fleet_event(fleet_event, ctx);
                }
            }
        }
        self.collect_finished();
    }

    /// One AI tick: due retries, fleet upkeep, then strategy, lookout and
    /// diplomacy on their own cadences
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let now = ctx.now;

        for task in self.core.scheduler.take_due(now) {
            let event = self
                .core
                .units
                .run_task(task, &self.core.config.fleet, ctx, &mut self.core.scheduler);
            if let Some(event) = event {
                self.core.on_fleet_event(event, ctx);
            }
        }
        for event in self.core.units.tick(ctx, &mut self.core.scheduler) {
            self.core.on_fleet_event(event, ctx);
        }

        let cadence = self.core.config.strategy.clone();
        if now % cadence.strategy_interval == 0 {
            self.strategy
                .handle_strategy(&mut self.core, self.combat.states(), ctx);
        }
        if now % cadence.lookout_interval == 0 {
            self.combat.lookout(&mut self.core, &self.strategy, ctx);
        }
        if now % cadence.diplomacy_interval == 0 {
            self.strategy.handle_diplomacy(&mut self.core, ctx);
        }
        self.collect_finished();
    }

    fn collect_finished(&mut self) {
        let finished = self.core.take_finished();
        if finished.is_empty() {
            return;
        }
        self.strategy.release_locks(&finished);
        self.history.extend(finished);
    }
}

impl std::fmt::Debug for FactionAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactionAi")
            .field("faction", &self.core.faction)
            .field("profile", &self.profile_name())
            .field("missions", &self.core.missions.len())
            .field("finished", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AiError;
    use crate::core::types::Point;
    use crate::sandbox::{CommandBuffer, SandboxWorld};
    use crate::world::UnitKind;

    const US: FactionId = FactionId(1);

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AiConfig::default();
        config.behavior.patrol_completion_ratio = 0.0;
        let err = FactionAi::new(US, false, 1, config).unwrap_err();
        assert!(matches!(err, AiError::InvalidConfig(_)));
    }

    #[test]
    fn test_same_seed_same_profile() {
        let a = FactionAi::new(US, false, 77, AiConfig::default()).unwrap();
        let b = FactionAi::new(US, false, 77, AiConfig::default()).unwrap();
        assert_eq!(a.profile_name(), b.profile_name());
    }

    #[test]
    fn test_finished_mission_frees_ships() {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(US, false, Point::new(5.0, 5.0));
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let mut ai = FactionAi::new(US, false, 3, AiConfig::default()).unwrap();

        let mut buffer = CommandBuffer::new(&world);
        let mut ctx = TickContext::new(1, &world, &mut buffer);
        let plan = MissionPlan::Scouting {
            ships: vec![ship],
            target: Some(Point::new(50.0, 50.0)),
        };
        let id = ai.core.start_mission(plan, &mut ctx);
        assert!(ai.mission(id).is_some());
        assert_eq!(ai.unit_manager().fleet_count(), 1);

        ai.handle_event(WorldEvent::UnitRemoved { unit: ship }, &mut ctx);
        assert!(ai.mission(id).is_none());
        assert_eq!(ai.unit_manager().fleet_count(), 0);
        let finished = ai.finished_missions();
        assert_eq!(finished.len(), 1);
        assert!(!finished[0].success);
        assert_eq!(finished[0].message, "All ships lost");
    }
}
