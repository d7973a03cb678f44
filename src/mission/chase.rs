//! Chase-and-attack: hunt one enemy ship until it sinks

use crate::core::types::{FactionId, UnitId};
use crate::geometry::Shape;
use crate::mission::{fled, flee, sail, Handler, MissionCore, MissionEnv, MissionStep, PhaseTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChasePhase {
    Created,
    Chasing,
    Engaging,
    FleeingHome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChaseShipsAndAttack {
    phase: ChasePhase,
    enemy: FactionId,
    target: UnitId,
}

impl ChaseShipsAndAttack {
    pub fn new(enemy: FactionId, target: UnitId) -> Self {
        Self {
            phase: ChasePhase::Created,
            enemy,
            target,
        }
    }

    pub fn target(&self) -> UnitId {
        self.target
    }

    /// Success or failure if the hunt is over, `None` while it goes on
    fn hunt_over(&self, core: &MissionCore, env: &MissionEnv<'_, '_>) -> Option<MissionStep> {
        if env.ctx.world.unit(self.target).is_none() {
            return Some(MissionStep::Success("Target destroyed".to_string()));
        }
        if !env.ctx.world.are_enemies(core.faction, self.enemy) {
            return Some(MissionStep::Failure("Target no longer hostile".to_string()));
        }
        None
    }

    fn chase(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        if let Some(step) = self.hunt_over(core, env) {
            return step;
        }
        let Some(target) = env.ctx.world.unit(self.target) else {
            return MissionStep::Success("Target destroyed".to_string());
        };
        self.phase = ChasePhase::Chasing;
        let area = Shape::circle(target.position, env.config.missions.chase_target_range);
        let ratio = env.config.missions.chase_completion_ratio;
        sail(core, env, area, ratio)
    }

    fn caught_up(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        if let Some(step) = self.hunt_over(core, env) {
            return step;
        }
        let range = env.config.missions.chase_target_range * 2.0;
        let close = match (env.fleet_position(core.fleet), env.ctx.world.unit(self.target)) {
            (Some(fleet), Some(target)) => fleet.distance(&target.position) <= range,
            _ => false,
        };
        if !close {
            return self.chase(core, env);
        }

        self.phase = ChasePhase::Engaging;
        for unit in env.fleet_units(core.fleet) {
            env.ctx.commands.attack(unit, self.target);
        }
        core.combat_phase = true;
        MissionStep::Continue
    }

    fn flee_home(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.phase = ChasePhase::FleeingHome;
        match env.home(core.faction).or_else(|| env.fleet_position(core.fleet)) {
            Some(home) => flee(core, env, home),
            None => fled(core),
        }
    }

    fn fled_home(&mut self, core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        fled(core)
    }
}

impl PhaseTable for ChaseShipsAndAttack {
    type Phase = ChasePhase;

    const NAME: &'static str = "chase_ships_and_attack";

    const PAUSABLE: &'static [ChasePhase] = &[ChasePhase::Chasing, ChasePhase::Engaging];

    const COMBAT_HANDLERS: &'static [(ChasePhase, Handler<Self>, Handler<Self>)] = &[
        (ChasePhase::Chasing, ChaseShipsAndAttack::chase, ChaseShipsAndAttack::flee_home),
        (ChasePhase::Engaging, ChaseShipsAndAttack::chase, ChaseShipsAndAttack::flee_home),
    ];

    const ARRIVAL_HANDLERS: &'static [(ChasePhase, Handler<Self>)] = &[
        (ChasePhase::Chasing, ChaseShipsAndAttack::caught_up),
        (ChasePhase::FleeingHome, ChaseShipsAndAttack::fled_home),
    ];

    fn phase(&self) -> ChasePhase {
        self.phase
    }

    fn start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.chase(core, env)
    }
}
