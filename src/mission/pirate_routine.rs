//! Pirate routine: roam to a random spot, sail home, repeat
//!
//! Each run ends in success once the ships are back at the base; the
//! pirate strategy starts the next run for them.

use crate::geometry::Shape;
use crate::mission::{fled, flee, sail, Handler, MissionCore, MissionEnv, MissionStep, PhaseTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PirateRoutinePhase {
    Created,
    Roaming,
    SailingHome,
    FleeingHome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PirateRoutineMission {
    phase: PirateRoutinePhase,
}

impl Default for PirateRoutineMission {
    fn default() -> Self {
        Self::new()
    }
}

impl PirateRoutineMission {
    pub fn new() -> Self {
        Self {
            phase: PirateRoutinePhase::Created,
        }
    }

    fn roam(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let Some(spot) = env.ctx.world.random_reachable_position(&mut *env.rng) else {
            return MissionStep::Failure("No reachable position".to_string());
        };
        self.phase = PirateRoutinePhase::Roaming;
        let ratio = env.config.missions.pirate_completion_ratio;
        sail(core, env, spot.into(), ratio)
    }

    fn sail_home(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let Some(home) = env.home(core.faction) else {
            return MissionStep::Success("Routine finished".to_string());
        };
        self.phase = PirateRoutinePhase::SailingHome;
        let area = Shape::circle(home, env.config.missions.home_area_radius);
        let ratio = env.config.missions.pirate_completion_ratio;
        sail(core, env, area, ratio)
    }

    fn back_home(&mut self, _core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        MissionStep::Success("Routine finished".to_string())
    }

    fn flee_home(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.phase = PirateRoutinePhase::FleeingHome;
        match env.home(core.faction).or_else(|| env.fleet_position(core.fleet)) {
            Some(home) => flee(core, env, home),
            None => fled(core),
        }
    }

    fn fled_home(&mut self, core: &mut MissionCore, _env: &mut MissionEnv<'_, '_>) -> MissionStep {
        fled(core)
    }
}

impl PhaseTable for PirateRoutineMission {
    type Phase = PirateRoutinePhase;

    const NAME: &'static str = "pirate_routine";

    const PAUSABLE: &'static [PirateRoutinePhase] =
        &[PirateRoutinePhase::Roaming, PirateRoutinePhase::SailingHome];

    // Resuming a roam picks a fresh spot
    const COMBAT_HANDLERS: &'static [(PirateRoutinePhase, Handler<Self>, Handler<Self>)] = &[
        (PirateRoutinePhase::Roaming, PirateRoutineMission::roam, PirateRoutineMission::flee_home),
        (PirateRoutinePhase::SailingHome, PirateRoutineMission::sail_home, PirateRoutineMission::flee_home),
    ];

    const ARRIVAL_HANDLERS: &'static [(PirateRoutinePhase, Handler<Self>)] = &[
        (PirateRoutinePhase::Roaming, PirateRoutineMission::sail_home),
        (PirateRoutinePhase::SailingHome, PirateRoutineMission::back_home),
        (PirateRoutinePhase::FleeingHome, PirateRoutineMission::fled_home),
    ];

    fn phase(&self) -> PirateRoutinePhase {
        self.phase
    }

    fn start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        self.roam(core, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FactionId, MissionId, Point};
    use crate::fleet::UnitManager;
    use crate::mission::test_support::with_env;
    use crate::mission::{Mission, MissionPlan};
    use crate::sandbox::SandboxWorld;
    use crate::schedule::Scheduler;
    use crate::world::UnitKind;

    const PIRATES: FactionId = FactionId(9);

    #[test]
    fn test_roam_then_home() {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(PIRATES, true, Point::new(90.0, 90.0));
        let ship = world.spawn_unit(PIRATES, UnitKind::PirateShip, Point::new(88.0, 88.0), 80.0);
        let mut units = UnitManager::new(PIRATES);
        let mut scheduler = Scheduler::new();
        let mut mission = Mission::new(MissionId(1), PIRATES, MissionPlan::PirateRoutine { ships: vec![ship] }, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            assert_eq!(mission.start(env), MissionStep::Continue);
            assert_eq!(mission.phase_name(), "Roaming");
            assert_eq!(mission.on_fleet_arrived(env), MissionStep::Continue);
            assert_eq!(mission.phase_name(), "SailingHome");
            assert_eq!(
                mission.on_fleet_arrived(env),
                MissionStep::Success("Routine finished".to_string())
            );
        });
    }

    #[test]
    fn test_abort_while_roaming_flees() {
        let mut world = SandboxWorld::new(100.0, 100.0);
        world.add_faction(PIRATES, true, Point::new(90.0, 90.0));
        let ship = world.spawn_unit(PIRATES, UnitKind::PirateShip, Point::new(50.0, 50.0), 80.0);
        let mut units = UnitManager::new(PIRATES);
        let mut scheduler = Scheduler::new();
        let mut mission = Mission::new(MissionId(1), PIRATES, MissionPlan::PirateRoutine { ships: vec![ship] }, &mut units);

        with_env(&world, &mut units, &mut scheduler, |env| {
            mission.start(env);
            mission.pause(env);
            assert_eq!(mission.abort("Navy frigates", env), MissionStep::Continue);
            assert_eq!(
                mission.on_fleet_arrived(env),
                MissionStep::Failure("Navy frigates".to_string())
            );
        });
    }
}
