//! Missions: multi-tick plans owning one fleet
//!
//! Every mission walks a linear list of phases. Two static tables per
//! mission type say what to do when a fleet move completes in a phase and
//! how to resume or abort a phase once a fight interrupted it. Only phases
//! listed as pausable may be interrupted; [`validate_tables`] checks that
//! each of them has both combat handlers before any faction is built.

pub mod chase;
pub mod pirate_routine;
pub mod scouting;
pub mod surprise;

pub use chase::ChaseShipsAndAttack;
pub use pirate_routine::PirateRoutineMission;
pub use scouting::Scouting;
pub use surprise::SurpriseAttack;

use std::fmt::Debug;

use rand::RngCore;
use tracing::{debug, info};

use crate::core::config::AiConfig;
use crate::core::error::{AiError, Result};
use crate::core::types::{FactionId, FleetId, MissionId, Point, UnitId};
use crate::fleet::{FleetOwner, UnitManager};
use crate::geometry::Shape;
use crate::schedule::Scheduler;
use crate::world::TickContext;

/// Result of a mission handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionStep {
    Continue,
    Success(String),
    Failure(String),
}

impl MissionStep {
    pub fn is_finished(&self) -> bool {
        !matches!(self, MissionStep::Continue)
    }
}

/// What a strategy component asks for
#[derive(Debug, Clone, PartialEq)]
pub enum MissionPlan {
    /// Sail to `target` (random when `None`) and back
    Scouting {
        ships: Vec<UnitId>,
        target: Option<Point>,
    },
    ChaseShipsAndAttack {
        ships: Vec<UnitId>,
        enemy: FactionId,
        target: UnitId,
    },
    SurpriseAttack {
        ships: Vec<UnitId>,
        enemy: FactionId,
        target: Point,
    },
    PirateRoutine { ships: Vec<UnitId> },
}

impl MissionPlan {
    pub fn ships(&self) -> &[UnitId] {
        match self {
            MissionPlan::Scouting { ships, .. }
            | MissionPlan::ChaseShipsAndAttack { ships, .. }
            | MissionPlan::SurpriseAttack { ships, .. }
            | MissionPlan::PirateRoutine { ships } => ships,
        }
    }
}

/// State shared by every mission type
#[derive(Debug, Clone, PartialEq)]
pub struct MissionCore {
    pub id: MissionId,
    pub faction: FactionId,
    pub fleet: FleetId,
    pub combat_phase: bool,
    /// Why the mission gave up, reported once the retreat ends
    pub abort_reason: Option<String>,
}

impl MissionCore {
    fn failure_message(&mut self) -> String {
        self.abort_reason
            .take()
            .unwrap_or_else(|| "Retreated".to_string())
    }
}

/// Everything a mission handler may touch during one call
pub struct MissionEnv<'a, 'w> {
    pub ctx: &'a mut TickContext<'w>,
    pub units: &'a mut UnitManager,
    pub scheduler: &'a mut Scheduler,
    pub config: &'a AiConfig,
    pub rng: &'a mut dyn RngCore,
}

impl MissionEnv<'_, '_> {
    pub fn move_fleet(&mut self, fleet: FleetId, target: Shape, ratio: f64) -> Result<()> {
        let fleet = self
            .units
            .fleet_mut(fleet)
            .ok_or(AiError::FleetNotFound(fleet))?;
        fleet.move_to(target, ratio, &self.config.fleet, self.ctx, self.scheduler)?;
        Ok(())
    }

    pub fn stop_fleet(&mut self, fleet: FleetId) {
        if let Some(fleet) = self.units.fleet_mut(fleet) {
            fleet.stop(self.ctx);
        }
    }

    pub fn fleet_position(&self, fleet: FleetId) -> Option<Point> {
        self.units.fleet(fleet)?.position(&*self.ctx)
    }

    pub fn fleet_units(&self, fleet: FleetId) -> Vec<UnitId> {
        self.units
            .fleet(fleet)
            .map(|f| f.units())
            .unwrap_or_default()
    }

    pub fn home(&self, faction: FactionId) -> Option<Point> {
        self.ctx.world.faction_home(faction)
    }
}

/// Move the fleet; a refused order fails the mission
pub(crate) fn sail(
    core: &mut MissionCore,
    env: &mut MissionEnv<'_, '_>,
    target: Shape,
    ratio: f64,
) -> MissionStep {
    match env.move_fleet(core.fleet, target, ratio) {
        Ok(()) => MissionStep::Continue,
        Err(err) => MissionStep::Failure(format!("Destination unreachable: {}", err)),
    }
}

/// Retreat towards `destination`; arrival there ends the mission as failed
pub(crate) fn flee(
    core: &mut MissionCore,
    env: &mut MissionEnv<'_, '_>,
    destination: Point,
) -> MissionStep {
    let target = Shape::circle(destination, env.config.missions.home_area_radius);
    let ratio = env.config.missions.flee_completion_ratio;
    match env.move_fleet(core.fleet, target, ratio) {
        Ok(()) => MissionStep::Continue,
        Err(err) => MissionStep::Failure(format!("{} ({})", core.failure_message(), err)),
    }
}

/// Arrival at the retreat point
pub(crate) fn fled(core: &mut MissionCore) -> MissionStep {
    MissionStep::Failure(core.failure_message())
}

pub type Handler<M> = fn(&mut M, &mut MissionCore, &mut MissionEnv<'_, '_>) -> MissionStep;

/// Phase tables of one mission type
pub trait PhaseTable: Sized + 'static {
    type Phase: Copy + PartialEq + Debug + 'static;

    const NAME: &'static str;

    /// Phases a fight may interrupt
    const PAUSABLE: &'static [Self::Phase];

    /// (phase, resume, abort)
    const COMBAT_HANDLERS: &'static [(Self::Phase, Handler<Self>, Handler<Self>)];

    const ARRIVAL_HANDLERS: &'static [(Self::Phase, Handler<Self>)];

    fn phase(&self) -> Self::Phase;

    fn start(&mut self, core: &mut MissionCore, env: &mut MissionEnv<'_, '_>) -> MissionStep;
}

/// Every pausable phase needs both combat handlers
pub fn validate_table<M: PhaseTable>() -> Result<()> {
    for phase in M::PAUSABLE {
        if !M::COMBAT_HANDLERS.iter().any(|(p, _, _)| p == phase) {
            return Err(AiError::IncompleteMissionTable {
                mission: M::NAME,
                phase: format!("{:?}", phase),
                handler: "resume/abort",
            });
        }
    }
    Ok(())
}

pub fn validate_tables() -> Result<()> {
    validate_table::<Scouting>()?;
    validate_table::<ChaseShipsAndAttack>()?;
    validate_table::<SurpriseAttack>()?;
    validate_table::<PirateRoutineMission>()?;
    Ok(())
}

fn combat_handlers<M: PhaseTable>(mission: &M, core: &MissionCore) -> (Handler<M>, Handler<M>) {
    let phase = mission.phase();
    match M::COMBAT_HANDLERS.iter().find(|(p, _, _)| *p == phase) {
        Some(&(_, resume, abort)) => (resume, abort),
        None => panic!(
            "{} {} has no combat handlers for phase {:?}",
            M::NAME,
            core.id,
            phase
        ),
    }
}

fn resume_phase<M: PhaseTable>(
    mission: &mut M,
    core: &mut MissionCore,
    env: &mut MissionEnv<'_, '_>,
) -> MissionStep {
    assert!(
        core.combat_phase,
        "{} {} resumed while not in combat",
        M::NAME,
        core.id
    );
    let (resume, _) = combat_handlers(mission, core);
    core.combat_phase = false;
    resume(mission, core, env)
}

fn abort_phase<M: PhaseTable>(
    mission: &mut M,
    core: &mut MissionCore,
    env: &mut MissionEnv<'_, '_>,
) -> MissionStep {
    let (_, abort) = combat_handlers(mission, core);
    core.combat_phase = false;
    abort(mission, core, env)
}

fn arrival_phase<M: PhaseTable>(
    mission: &mut M,
    core: &mut MissionCore,
    env: &mut MissionEnv<'_, '_>,
) -> MissionStep {
    let phase = mission.phase();
    match M::ARRIVAL_HANDLERS.iter().find(|(p, _)| *p == phase) {
        Some(&(_, handler)) => handler(mission, core, env),
        None => {
            debug!(mission = %core.id, ?phase, "arrival ignored");
            MissionStep::Continue
        }
    }
}

fn pausable<M: PhaseTable>(mission: &M) -> bool {
    M::PAUSABLE.contains(&mission.phase())
}

#[derive(Debug, Clone, PartialEq)]
pub enum MissionKind {
    Scouting(Scouting),
    ChaseShipsAndAttack(ChaseShipsAndAttack),
    SurpriseAttack(SurpriseAttack),
    PirateRoutine(PirateRoutineMission),
}

macro_rules! with_mission {
    ($kind:expr, $m:ident => $body:expr) => {
        match $kind {
            MissionKind::Scouting($m) => $body,
            MissionKind::ChaseShipsAndAttack($m) => $body,
            MissionKind::SurpriseAttack($m) => $body,
            MissionKind::PirateRoutine($m) => $body,
        }
    };
}

fn table_name<M: PhaseTable>(_: &M) -> &'static str {
    M::NAME
}

fn phase_name<M: PhaseTable>(mission: &M) -> String {
    format!("{:?}", mission.phase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    core: MissionCore,
    kind: MissionKind,
}

impl Mission {
    /// Put the plan's ships in a new fleet owned by the mission
    ///
    /// # Panics
    /// If the plan has no ships or one of them is already in a fleet.
    pub fn new(id: MissionId, faction: FactionId, plan: MissionPlan, units: &mut UnitManager) -> Self {
        let fleet = units.create_fleet(plan.ships(), FleetOwner::Mission(id));
        let kind = match plan {
            MissionPlan::Scouting { target, .. } => MissionKind::Scouting(Scouting::new(target)),
            MissionPlan::ChaseShipsAndAttack { enemy, target, .. } => {
                MissionKind::ChaseShipsAndAttack(ChaseShipsAndAttack::new(enemy, target))
            }
            MissionPlan::SurpriseAttack { enemy, target, .. } => {
                MissionKind::SurpriseAttack(SurpriseAttack::new(enemy, target))
            }
            MissionPlan::PirateRoutine { .. } => {
                MissionKind::PirateRoutine(PirateRoutineMission::new())
            }
        };
        Self {
            core: MissionCore {
                id,
                faction,
                fleet,
                combat_phase: false,
                abort_reason: None,
            },
            kind,
        }
    }

    pub fn id(&self) -> MissionId {
        self.core.id
    }

    pub fn faction(&self) -> FactionId {
        self.core.faction
    }

    pub fn fleet(&self) -> FleetId {
        self.core.fleet
    }

    pub fn in_combat(&self) -> bool {
        self.core.combat_phase
    }

    pub fn kind(&self) -> &MissionKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        with_mission!(&self.kind, m => table_name(m))
    }

    pub fn phase_name(&self) -> String {
        with_mission!(&self.kind, m => phase_name(m))
    }

    pub fn start(&mut self, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        info!(
            faction = %self.core.faction,
            mission = %self.core.id,
            kind = self.name(),
            "mission started"
        );
        let core = &mut self.core;
        with_mission!(&mut self.kind, m => m.start(core, env))
    }

    /// Whether the current phase may be interrupted by a fight
    pub fn can_pause(&self) -> bool {
        with_mission!(&self.kind, m => pausable(m))
    }

    /// Flag combat phase and stop the fleet in place
    pub fn pause(&mut self, env: &mut MissionEnv<'_, '_>) {
        debug!(mission = %self.core.id, phase = %self.phase_name(), "mission paused");
        self.core.combat_phase = true;
        env.stop_fleet(self.core.fleet);
    }

    /// Leave combat phase and pick the plan up again
    ///
    /// # Panics
    /// If not in combat phase or the phase has no resume handler.
    pub fn continue_mission(&mut self, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        debug!(mission = %self.core.id, phase = %self.phase_name(), "mission resumed");
        let core = &mut self.core;
        with_mission!(&mut self.kind, m => resume_phase(m, core, env))
    }

    /// Give up the current phase and retreat
    ///
    /// # Panics
    /// If the phase has no abort handler.
    pub fn abort(&mut self, reason: &str, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        info!(mission = %self.core.id, phase = %self.phase_name(), reason, "mission aborted");
        self.core.abort_reason = Some(reason.to_string());
        let core = &mut self.core;
        with_mission!(&mut self.kind, m => abort_phase(m, core, env))
    }

    pub fn on_fleet_arrived(&mut self, env: &mut MissionEnv<'_, '_>) -> MissionStep {
        let core = &mut self.core;
        with_mission!(&mut self.kind, m => arrival_phase(m, core, env))
    }

    pub fn on_all_ships_lost(&mut self) -> MissionStep {
        MissionStep::Failure("All ships lost".to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::sandbox::{CommandBuffer, SandboxWorld};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub const US: FactionId = FactionId(1);
    pub const THEM: FactionId = FactionId(2);

    pub fn world() -> SandboxWorld {
        let mut world = SandboxWorld::new(200.0, 200.0);
        world.add_faction(US, false, Point::new(5.0, 5.0));
        world.add_faction(THEM, false, Point::new(180.0, 180.0));
        world
    }

    /// Run `f` with a mission environment over `world`
    pub fn with_env<R>(
        world: &SandboxWorld,
        units: &mut UnitManager,
        scheduler: &mut Scheduler,
        f: impl FnOnce(&mut MissionEnv<'_, '_>) -> R,
    ) -> R {
        let config = AiConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut buffer = CommandBuffer::new(world);
        let mut ctx = TickContext::new(0, world, &mut buffer);
        let mut env = MissionEnv {
            ctx: &mut ctx,
            units,
            scheduler,
            config: &config,
            rng: &mut rng,
        };
        f(&mut env)
    }
}
