//! Scouting: sail out to a point and come back

use crate::core::types::Point;
use crate::geometry::Shape;
use crate::mission::{fled, flee, sail, Handler, MissionCore, MissionEnv, MissionStep, PhaseTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoutingPhase {
    Created,
    SailingToTarget,
    SailingBack,
    FleeingHome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scouting {
    phase: ScoutingPhase,
    target: Option<Point>,
    start_point: Option<Point>,
}

impl Scouting {
    pub fn new(target: Option<Point>) -> Self {
        Self {
            phase: ScoutingPhase::Created,
            target,
            start_point: None,
        }
    }

    pub fn target(&self) -> Option<Point> {
        self.target
    }

    fn sail_to_target(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let Some(target) = self.target else {
            return MissionStep::Failure("No target to scout".to_string());
        };
        self.phase = ScoutingPhase::SailingToTarget;
        let ratio = env.config.missions.scouting_completion_ratio;
        sail(core, env, target.into(), ratio)
    }

    fn sail_back(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let Some(start) = self.start_point else {
            return MissionStep::Success("Scouted".to_string());
        };
        self.phase = ScoutingPhase::SailingBack;
        let ratio = env.config.missions.scouting_completion_ratio;
        let area = Shape::circle(start, env.config.missions.home_area_radius);
        sail(core, env, area, ratio)
    }

    fn returned(&mut self, _core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        MissionStep::Success("Scouted".to_string())
    }

    fn flee_to_start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.phase = ScoutingPhase::FleeingHome;
        let destination = self
            .start_point
            .or_else(|| env.home(core.faction))
            .or_else(|| env.fleet_position(core.fleet));
        match destination {
            Some(point) => flee(core, env, point),
            None => fled(core),
        }
    }

    fn fled_home(&mut self, core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        fled(core)
    }
}

impl PhaseTable for Scouting {
    type Phase = ScoutingPhase;

    const NAME: &'static str = "scouting";

    const PAUSABLE: &'static [ScoutingPhase] =
        &[ScoutingPhase::SailingToTarget, ScoutingPhase::SailingBack];

    const COMBAT_HANDLERS: &'static [(ScoutingPhase, Handler<Self>, Handler<Self>)] = &[
        (ScoutingPhase::SailingToTarget, Scouting::sail_to_target, Scouting::flee_to_start),
        (ScoutingPhase::SailingBack, Scouting::sail_back, Scouting::flee_to_start),
    ];

    const ARRIVAL_HANDLERS: &'static [(ScoutingPhase, Handler<Self>)] = &[
        (ScoutingPhase::SailingToTarget, Scouting::sail_back),
        (ScoutingPhase::SailingBack, Scouting::returned),
        (ScoutingPhase::FleeingHome, Scouting::fled_home),
    ];

    fn phase(&self) -> ScoutingPhase {
        self.phase
    }

    fn start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.start_point = env.fleet_position(core.fleet);
        if self.target.is_none() {
            self.target = env.ctx.world.random_reachable_position(&mut *env.rng);
        }
        self.sail_to_target(core, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MissionId;
    use crate::fleet::UnitManager;
    use crate::mission::test_support::{with_env, world, US};
    use crate::mission::{Mission, MissionKind, MissionPlan};
    use crate::schedule::Scheduler;
    use crate::world::UnitKind;

    #[test]
    fn test_out_and_back() {
        let mut world = world();
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let mut units = UnitManager::new(US);
        let mut scheduler = Scheduler::new();
        let plan = MissionPlan::Scouting { ships: vec![ship], target: Some(Point::new(60.0, 60.0)) };
        let mut mission = Mission::new(MissionId(1), US, plan, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            assert_eq!(mission.start(env), MissionStep::Continue);
            assert_eq!(mission.phase_name(), "SailingToTarget");
            assert_eq!(mission.on_fleet_arrived(env), MissionStep::Continue);
            assert_eq!(mission.phase_name(), "SailingBack");
            assert_eq!(mission.on_fleet_arrived(env), MissionStep::Success("Scouted".to_string()));
        });
    }

    #[test]
    fn test_random_target_when_unspecified() {
        let mut world = world();
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let mut units = UnitManager::new(US);
        let mut scheduler = Scheduler::new();
        let plan = MissionPlan::Scouting { ships: vec![ship], target: None };
        let mut mission = Mission::new(MissionId(1), US, plan, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            assert_eq!(mission.start(env), MissionStep::Continue);
        });
        let MissionKind::Scouting(scouting) = mission.kind() else {
            panic!("expected scouting");
        };
        assert!(scouting.target().is_some());
    }

    #[test]
    fn test_abort_flees_to_start_and_fails() {
        let mut world = world();
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let mut units = UnitManager::new(US);
        let mut scheduler = Scheduler::new();
        let plan = MissionPlan::Scouting { ships: vec![ship], target: Some(Point::new(60.0, 60.0)) };
        let mut mission = Mission::new(MissionId(1), US, plan, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            mission.start(env);
            mission.pause(env);
            assert_eq!(mission.abort("Outgunned", env), MissionStep::Continue);
            assert_eq!(mission.phase_name(), "FleeingHome");
            assert!(!mission.can_pause());
            assert_eq!(mission.on_fleet_arrived(env), MissionStep::Failure("Outgunned".to_string()));
        });
    }

    #[test]
    fn test_unreachable_target_fails() {
        let mut world = world();
        let ship = world.spawn_unit(US, UnitKind::Frigate, Point::new(10.0, 10.0), 100.0);
        let mut units = UnitManager::new(US);
        let mut scheduler = Scheduler::new();
        let plan = MissionPlan::Scouting { ships: vec![ship], target: Some(Point::new(-50.0, 10.0)) };
        let mut mission = Mission::new(MissionId(1), US, plan, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            assert!(matches!(mission.start(env), MissionStep::Failure(_)));
        });
    }
}
