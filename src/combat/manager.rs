//! Lookout pass and single-ship combat states

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::behavior::{
    ActionBucket, Category, CombatSituation, Decision, Environment, IdleSituation, Situation,
    SituationKind,
};
use crate::combat::CombatState;
use crate::core::types::{FleetId, MissionId, Point, UnitId};
use crate::faction::{FactionCore, MissionOp};
use crate::fleet::{filter_units, FleetOwner, UnitFilter};
use crate::geometry::{power_balance, Shape};
use crate::strategy::StrategyManager;
use crate::world::{MoveOutcome, Relation, TickContext, WorldView};

/// What a scan found around a group
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    pub kind: SituationKind,
    pub enemies: Vec<UnitId>,
    pub power_balance: f64,
}

/// Tracks what each fleet-free ship is doing; idle ships have no entry
#[derive(Debug, Default)]
pub struct CombatManager {
    states: BTreeMap<UnitId, CombatState>,
}

impl CombatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, unit: UnitId) -> CombatState {
        self.states.get(&unit).copied().unwrap_or_default()
    }

    pub fn states(&self) -> &BTreeMap<UnitId, CombatState> {
        &self.states
    }

    fn set_state(&mut self, unit: UnitId, state: CombatState) {
        if state == CombatState::Idle {
            self.states.remove(&unit);
        } else {
            self.states.insert(unit, state);
        }
    }

    /// Ships joining a fleet leave single-ship tracking
    pub fn forget(&mut self, units: &[UnitId]) {
        for unit in units {
            self.states.remove(unit);
        }
    }

    pub fn on_unit_removed(&mut self, unit: UnitId) {
        self.states.remove(&unit);
    }

    /// Move result for a ship outside any fleet
    pub(crate) fn on_move_finished(
        &mut self,
        core: &FactionCore,
        unit: UnitId,
        outcome: MoveOutcome,
        ctx: &mut TickContext<'_>,
    ) {
        let previous = self.state(unit);
        let next = match (previous, outcome) {
            // Caught the prey: the raid is done, head back
            (CombatState::Chasing, MoveOutcome::Reached) => self.send_home(core, unit, ctx),
            _ => CombatState::Idle,
        };
        debug!(faction = %core.faction, %unit, ?previous, ?next, ?outcome, "ship move finished");
        self.set_state(unit, next);
    }

    fn send_home(&self, core: &FactionCore, unit: UnitId, ctx: &mut TickContext<'_>) -> CombatState {
        let Some(home) = ctx.world.faction_home(core.faction) else {
            return CombatState::Idle;
        };
        match ctx
            .commands
            .move_unit(unit, Shape::circle(home, core.config.combat.home_radius))
        {
            Ok(()) => CombatState::GoingHome,
            Err(err) => {
                debug!(%unit, %err, "cannot sail home");
                CombatState::Idle
            }
        }
    }

    fn order_move(&mut self, unit: UnitId, target: Shape, state: CombatState, ctx: &mut TickContext<'_>) {
        match ctx.commands.move_unit(unit, target) {
            Ok(()) => self.set_state(unit, state),
            Err(err) => {
                debug!(%unit, %err, "move refused");
                self.set_state(unit, CombatState::Idle);
            }
        }
    }

    /// Foreign ships near `group`, first class present in policy order
    pub(crate) fn scan(
        &self,
        core: &FactionCore,
        group: &[UnitId],
        radius: f64,
        world: &dyn WorldView,
    ) -> Option<Sighting> {
        if core.config.combat.debug_radii {
            debug!(faction = %core.faction, radius, group = group.len(), "lookout radius");
        }
        let ours: Vec<f64> = group
            .iter()
            .filter_map(|id| world.unit(*id).map(|u| u.health))
            .collect();
        if ours.is_empty() {
            return None;
        }

        let nearby = core.units.find_units_near(group, radius, world);
        if nearby.is_empty() {
            return None;
        }
        for (class, kind) in core.policy.scan_classes {
            let enemies = filter_units(&nearby, &class.filters(core.faction), world);
            let theirs: Vec<f64> = enemies
                .iter()
                .filter_map(|id| world.unit(*id).map(|u| u.health))
                .collect();
            if theirs.is_empty() || theirs.iter().sum::<f64>() <= 0.0 {
                continue;
            }
            return Some(Sighting {
                kind: *kind,
                enemies,
                power_balance: power_balance(&ours, &theirs),
            });
        }
        None
    }

    /// One lookout pass: missions first, then free ships and patrols
    pub(crate) fn lookout(
        &mut self,
        core: &mut FactionCore,
        strategy: &StrategyManager,
        ctx: &mut TickContext<'_>,
    ) {
        self.states.retain(|unit, _| ctx.world.unit(*unit).is_some());
        self.watch_missions(core, strategy, ctx);
        self.watch_free_ships(core, ctx);
        self.watch_patrols(core, ctx);
        self.watch_busy_ships(core, ctx);
    }

    fn watch_missions(
        &mut self,
        core: &mut FactionCore,
        strategy: &StrategyManager,
        ctx: &mut TickContext<'_>,
    ) {
        let radius = core.config.combat.fleet_search_radius;
        let ids: Vec<MissionId> = core.missions.keys().copied().collect();

        for id in ids {
            let Some(mission) = core.missions.get(&id) else {
                continue;
            };
            let in_combat = mission.in_combat();
            let pause_allowed = strategy.request_to_pause_mission(mission);
            let Some(members) = core.units.fleet(mission.fleet()).map(|f| f.units()) else {
                continue;
            };

            let sighting = self.scan(core, &members, radius, ctx.world);
            if in_combat {
                self.fight_for_mission(core, id, sighting, ctx);
                continue;
            }
            let Some(sighting) = sighting else {
                continue;
            };
            if pause_allowed {
                core.drive_mission(id, MissionOp::Pause, ctx);
                self.fight_for_mission(core, id, Some(sighting), ctx);
            } else {
                debug!(faction = %core.faction, mission = %id, "pause refused");
                self.dispatch(core, ActionBucket::Defensive, members, Some(id), sighting, ctx);
            }
        }
    }

    fn fight_for_mission(
        &mut self,
        core: &mut FactionCore,
        id: MissionId,
        sighting: Option<Sighting>,
        ctx: &mut TickContext<'_>,
    ) {
        let Some(sighting) = sighting else {
            core.drive_mission(id, MissionOp::Continue, ctx);
            return;
        };
        let Some(fleet) = core.missions.get(&id).and_then(|m| core.units.fleet(m.fleet())) else {
            return;
        };
        let idle = fleet.idle_units();
        let group = if idle.is_empty() { fleet.units() } else { idle };

        let at_war = sighting.enemies.iter().any(|enemy| {
            ctx.world
                .unit(*enemy)
                .is_some_and(|u| ctx.world.are_enemies(core.faction, u.owner))
        });
        let acted = self.dispatch(core, ActionBucket::Offensive, group, Some(id), sighting, ctx);
        // Nobody to fight and nothing chosen: carry on
        if !acted && !at_war {
            core.drive_mission(id, MissionOp::Continue, ctx);
        }
    }

    fn watch_free_ships(&mut self, core: &mut FactionCore, ctx: &mut TickContext<'_>) {
        let radius = core.config.combat.single_ship_search_radius;
        let idle_states = core.policy.idle_states;
        let own = core.units.units_of_faction(ctx.world);
        let candidates = filter_units(
            &own,
            &[
                UnitFilter::OfKind(core.policy.fighter_kinds),
                UnitFilter::Selectable,
                UnitFilter::NotInFleet(&core.units),
                UnitFilter::InState {
                    states: &self.states,
                    allowed: idle_states,
                },
            ],
            ctx.world,
        );

        for unit in candidates {
            // Earlier decisions this pass may have moved it or put it in a patrol
            if core.units.fleet_of(unit).is_some() || !idle_states.contains(&self.state(unit)) {
                continue;
            }
            match self.scan(core, &[unit], radius, ctx.world) {
                Some(sighting) => {
                    self.dispatch(core, ActionBucket::Offensive, vec![unit], None, sighting, ctx);
                }
                None => self.dispatch_idle(core, unit, radius, ctx),
            }
        }
    }

    /// A patrol that sights someone breaks up once a response is chosen
    fn watch_patrols(&mut self, core: &mut FactionCore, ctx: &mut TickContext<'_>) {
        let radius = core.config.combat.fleet_search_radius;
        let patrols: Vec<(FleetId, Vec<UnitId>)> = core
            .units
            .fleets()
            .filter(|f| f.owner() == FleetOwner::Patrol)
            .map(|f| (f.id(), f.units()))
            .collect();

        for (fleet, members) in patrols {
            let Some(sighting) = self.scan(core, &members, radius, ctx.world) else {
                continue;
            };
            let decision = Self::decide(core, ActionBucket::Offensive, members, None, sighting, ctx);
            let Some(decision) = decision else {
                continue;
            };
            let freed = core.units.disband_fleet(fleet, ctx, &mut core.scheduler);
            debug!(faction = %core.faction, %fleet, ships = freed.len(), "patrol broke off");
            self.apply(core, decision, None, ctx);
        }
    }

    fn watch_busy_ships(&mut self, core: &mut FactionCore, ctx: &mut TickContext<'_>) {
        if core.policy.busy_states.is_empty() {
            return;
        }
        let radius = core.config.combat.single_ship_search_radius;
        let busy: Vec<UnitId> = self
            .states
            .iter()
            .filter(|(_, state)| core.policy.busy_states.contains(state))
            .map(|(unit, _)| *unit)
            .collect();

        for unit in busy {
            if core.units.fleet_of(unit).is_some() {
                continue;
            }
            if let Some(sighting) = self.scan(core, &[unit], radius, ctx.world) {
                self.dispatch(core, ActionBucket::Defensive, vec![unit], None, sighting, ctx);
            }
        }
    }

    fn dispatch_idle(&mut self, core: &mut FactionCore, unit: UnitId, radius: f64, ctx: &mut TickContext<'_>) {
        let Some(info) = ctx.world.unit(unit) else {
            return;
        };
        let nearby = ctx.world.units_near(info.position, radius);
        let companions = filter_units(
            &nearby,
            &[
                UnitFilter::OwnedBy(core.faction),
                UnitFilter::OfKind(core.policy.fighter_kinds),
                UnitFilter::Selectable,
                UnitFilter::NotInFleet(&core.units),
                UnitFilter::InState {
                    states: &self.states,
                    allowed: core.policy.idle_states,
                },
            ],
            ctx.world,
        );
        let situation = Situation::Idle(IdleSituation {
            ship_group: vec![unit],
            companions,
        });
        let decision = {
            let env = Environment::new(core.faction, ctx.world, &core.config, &situation);
            core.behavior
                .select(Category::Action(ActionBucket::Idle), &env, &mut core.rng)
        };
        if let Some(decision) = decision {
            self.apply(core, decision, None, ctx);
        }
    }

    /// Ask the behavior manager about a sighting; true if it chose an action
    fn dispatch(
        &mut self,
        core: &mut FactionCore,
        bucket: ActionBucket,
        group: Vec<UnitId>,
        mission: Option<MissionId>,
        sighting: Sighting,
        ctx: &mut TickContext<'_>,
    ) -> bool {
        match Self::decide(core, bucket, group, mission, sighting, ctx) {
            Some(decision) => {
                self.apply(core, decision, mission, ctx);
                true
            }
            None => false,
        }
    }

    fn decide(
        core: &mut FactionCore,
        bucket: ActionBucket,
        group: Vec<UnitId>,
        mission: Option<MissionId>,
        sighting: Sighting,
        ctx: &TickContext<'_>,
    ) -> Option<Decision> {
        let situation = Situation::Combat(CombatSituation {
            kind: sighting.kind,
            ship_group: group,
            enemies: sighting.enemies,
            power_balance: sighting.power_balance,
            mission,
        });
        let env = Environment::new(core.faction, ctx.world, &core.config, &situation);
        core.behavior
            .select(Category::Action(bucket), &env, &mut core.rng)
    }

    fn apply(
        &mut self,
        core: &mut FactionCore,
        decision: Decision,
        mission: Option<MissionId>,
        ctx: &mut TickContext<'_>,
    ) {
        match decision {
            Decision::Attack { pairs } => {
                debug!(faction = %core.faction, pairs = pairs.len(), "attacking");
                for (unit, target) in pairs {
                    ctx.commands.attack(unit, target);
                }
            }
            // Mission fleets stay together: a chase becomes a plain attack
            Decision::Chase { pairs } if mission.is_some() => {
                for (unit, target) in pairs {
                    ctx.commands.attack(unit, target);
                }
            }
            Decision::Chase { pairs } => {
                for (hunter, prey) in pairs {
                    if let Some(prey) = ctx.world.unit(prey) {
                        self.order_move(hunter, Shape::Point(prey.position), CombatState::Chasing, ctx);
                    }
                }
            }
            Decision::Flee { units, destination } => match mission {
                Some(id) => Self::abort_mission(core, id, ctx),
                None => {
                    let area = Shape::circle(destination, core.config.combat.home_radius);
                    for unit in units {
                        self.order_move(unit, area, CombatState::Fleeing, ctx);
                    }
                }
            },
            Decision::ReturnHome { units, home } => {
                let area = Shape::circle(home, core.config.combat.home_radius);
                for unit in units {
                    self.order_move(unit, area, CombatState::GoingHome, ctx);
                }
            }
            Decision::DeclareWar { target } => {
                info!(faction = %core.faction, %target, "declaring war");
                ctx.commands.set_relation(core.faction, target, Relation::Enemy);
            }
            Decision::ChangeRelation { target, relation } => {
                ctx.commands.set_relation(core.faction, target, relation);
            }
            Decision::Patrol { units, destination } => self.start_patrol(core, &units, destination, ctx),
            Decision::StartMission(plan) => {
                self.forget(plan.ships());
                core.start_mission(plan, ctx);
            }
        }
    }

    fn abort_mission(core: &mut FactionCore, id: MissionId, ctx: &mut TickContext<'_>) {
        let abortable = core
            .missions
            .get(&id)
            .is_some_and(|m| m.in_combat() || m.can_pause());
        if abortable {
            core.drive_mission(id, MissionOp::Abort("Outmatched"), ctx);
        } else {
            debug!(faction = %core.faction, mission = %id, "already retreating");
        }
    }

    fn start_patrol(
        &mut self,
        core: &mut FactionCore,
        units: &[UnitId],
        destination: Point,
        ctx: &mut TickContext<'_>,
    ) {
        let free = filter_units(units, &[UnitFilter::NotInFleet(&core.units)], ctx.world);
        if free.is_empty() {
            return;
        }
        self.forget(&free);
        let id = core.units.create_fleet(&free, FleetOwner::Patrol);
        let ratio = core.config.behavior.patrol_completion_ratio;
        let result = match core.units.fleet_mut(id) {
            Some(fleet) => fleet.move_to(
                destination.into(),
                ratio,
                &core.config.fleet,
                ctx,
                &mut core.scheduler,
            ),
            None => return,
        };
        match result {
            Ok(()) => debug!(faction = %core.faction, fleet = %id, size = free.len(), "patrol started"),
            Err(err) => {
                debug!(faction = %core.faction, fleet = %id, %err, "patrol could not sail");
                core.units.destroy_fleet(id, &mut core.scheduler);
            }
        }
    }
}
