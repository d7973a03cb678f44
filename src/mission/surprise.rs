//! Surprise attack: sail to an enemy area, declare war there, fight, return

use crate::core::types::{FactionId, Point};
use crate::geometry::Shape;
use crate::mission::{fled, flee, sail, Handler, MissionCore, MissionEnv, MissionStep, PhaseTable};
use crate::world::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurprisePhase {
    Created,
    SailingToTarget,
    Fighting,
    SailingBack,
    FleeingHome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurpriseAttack {
    phase: SurprisePhase,
    enemy: FactionId,
    target: Point,
    return_point: Option<Point>,
}

impl SurpriseAttack {
    pub fn new(enemy: FactionId, target: Point) -> Self {
        Self {
            phase: SurprisePhase::Created,
            enemy,
            target,
            return_point: None,
        }
    }

    fn sail_to_target(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.phase = SurprisePhase::SailingToTarget;
        let area = Shape::circle(self.target, env.config.missions.surprise_attack_radius);
        let ratio = env.config.missions.surprise_completion_ratio;
        sail(core, env, area, ratio)
    }

    /// Break diplomacy if needed and let the lookout run the fight
    fn strike(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        if !env.ctx.world.are_enemies(core.faction, self.enemy) {
            env.ctx
                .commands
                .set_relation(core.faction, self.enemy, Relation::Enemy);
        }
        self.phase = SurprisePhase::Fighting;
        core.combat_phase = true;
        MissionStep::Continue
    }

    fn sail_back(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let Some(point) = self.return_point.or_else(|| env.home(core.faction)) else {
            return MissionStep::Success("Attack carried out".to_string());
        };
        self.phase = SurprisePhase::SailingBack;
        let area = Shape::circle(point, env.config.missions.home_area_radius);
        let ratio = env.config.missions.surprise_completion_ratio;
        sail(core, env, area, ratio)
    }

    fn returned(&mut self, _core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        MissionStep::Success("Attack carried out".to_string())
    }

    fn flee_back(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.phase = SurprisePhase::FleeingHome;
        let destination = self
            .return_point
            .or_else(|| env.home(core.faction))
            .or_else(|| env.fleet_position(core.fleet));
        match destination {
            Some(point) => flee(core, env, point),
            None => fled(core),
        }
    }

    fn fled_back(&mut self, core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        fled(core)
    }
}

impl PhaseTable for SurpriseAttack {
    type Phase = SurprisePhase;

    const NAME: &'static str = "surprise_attack";

    const PAUSABLE: &'static [SurprisePhase] = &[
        SurprisePhase::SailingToTarget,
        SurprisePhase::Fighting,
        SurprisePhase::SailingBack,
    ];

    const COMBAT_HANDLERS: &'static [(SurprisePhase, Handler<Self>, Handler<Self>)] = &[
        (SurprisePhase::SailingToTarget, SurpriseAttack::sail_to_target, SurpriseAttack::flee_back),
        (SurprisePhase::Fighting, SurpriseAttack::sail_back, SurpriseAttack::flee_back),
        (SurprisePhase::SailingBack, SurpriseAttack::sail_back, SurpriseAttack::flee_back),
    ];

    const ARRIVAL_HANDLERS: &'static [(SurprisePhase, Handler<Self>)] = &[
        (SurprisePhase::SailingToTarget, SurpriseAttack::strike),
        (SurprisePhase::SailingBack, SurpriseAttack::returned),
        (SurprisePhase::FleeingHome, SurpriseAttack::fled_back),
    ];

    fn phase(&self) -> SurprisePhase {
        self.phase
    }

    fn start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.return_point = env.fleet_position(core.fleet);
        self.sail_to_target(core, env)
    }
}
