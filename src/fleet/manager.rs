//! Fleet registry and unit queries for one faction

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::core::config::FleetConfig;
use crate::core::types::{FactionId, FleetId, UnitId};
use crate::fleet::filters::{filter_units, UnitFilter};
use crate::fleet::{Fleet, FleetEvent, FleetOwner};
use crate::schedule::{ScheduledTask, Scheduler};
use crate::world::{MoveOutcome, TickContext, WorldView};

/// Creates and destroys fleets and keeps the unit→fleet index in sync
#[derive(Debug)]
pub struct UnitManager {
    faction: FactionId,
    fleets: BTreeMap<FleetId, Fleet>,
    index: AHashMap<UnitId, FleetId>,
    next_fleet: u32,
}

impl UnitManager {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            fleets: BTreeMap::new(),
            index: AHashMap::new(),
            next_fleet: 0,
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// # Panics
    /// If `units` is empty or a unit already belongs to a fleet.
    pub fn create_fleet(&mut self, units: &[UnitId], owner: FleetOwner) -> FleetId {
        let id = FleetId(self.next_fleet);
        self.next_fleet += 1;

        let fleet = Fleet::new(id, owner, units);
        for unit in units {
            let previous = self.index.insert(*unit, id);
            assert!(
                previous.is_none(),
                "{} is already a member of {:?}",
                unit,
                previous
            );
        }
        self.fleets.insert(id, fleet);
        debug!(faction = %self.faction, fleet = %id, size = units.len(), "created fleet");
        id
    }

    /// Forget a fleet and its pending retries without touching its ships
    pub fn destroy_fleet(&mut self, id: FleetId, scheduler: &mut Scheduler) -> Option<Fleet> {
        let fleet = self.fleets.remove(&id)?;
        self.index.retain(|_, f| *f != id);
        scheduler.cancel_all_for(id);
        debug!(faction = %self.faction, fleet = %id, "destroyed fleet");
        Some(fleet)
    }

    /// Stop every member and destroy the fleet, returning its ships to idle
    pub fn disband_fleet(
        &mut self,
        id: FleetId,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Vec<UnitId> {
        let Some(mut fleet) = self.destroy_fleet(id, scheduler) else {
            return Vec::new();
        };
        fleet.stop(ctx);
        fleet.units()
    }

    pub fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.get(&id)
    }

    pub fn fleet_mut(&mut self, id: FleetId) -> Option<&mut Fleet> {
        self.fleets.get_mut(&id)
    }

    pub fn fleet_of(&self, unit: UnitId) -> Option<FleetId> {
        self.index.get(&unit).copied()
    }

    pub fn fleets(&self) -> impl Iterator<Item = &Fleet> {
        self.fleets.values()
    }

    pub fn fleet_count(&self) -> usize {
        self.fleets.len()
    }

    /// Forward a move result to the member's fleet
    ///
    /// Returns `None` both when nothing happened and when the unit is not in
    /// a fleet; check `fleet_of` first to tell those apart.
    pub fn on_move_finished(
        &mut self,
        unit: UnitId,
        outcome: MoveOutcome,
        config: &FleetConfig,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Option<FleetEvent> {
        let fleet_id = self.fleet_of(unit)?;
        let fleet = self.fleets.get_mut(&fleet_id)?;
        match outcome {
            MoveOutcome::Reached => fleet.on_ship_reached(unit),
            MoveOutcome::Blocked => fleet.on_ship_blocked(unit, config, ctx, scheduler),
        }
    }

    /// Remove a dead unit; an emptied fleet is destroyed here
    pub fn on_unit_removed(&mut self, unit: UnitId, scheduler: &mut Scheduler) -> Option<FleetEvent> {
        let fleet_id = self.index.remove(&unit)?;
        let event = self.fleets.get_mut(&fleet_id)?.on_member_lost(unit);
        if let Some(FleetEvent::Destroyed { fleet, .. }) = event {
            self.destroy_fleet(fleet, scheduler);
        }
        event
    }

    /// Run a due task; an arrival it completes or delivers is returned
    pub fn run_task(
        &mut self,
        task: ScheduledTask,
        config: &FleetConfig,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Option<FleetEvent> {
        match task {
            ScheduledTask::RetryBlockedShips(id) => {
                self.fleets.get_mut(&id)?.retry_blocked(config, ctx, scheduler)
            }
            ScheduledTask::ReportArrival(id) => self.fleets.get_mut(&id)?.take_unreported_arrival(),
        }
    }

    /// Drop members the world no longer knows about
    ///
    /// Covers removal notifications that never arrived.
    pub fn tick(&mut self, ctx: &TickContext<'_>, scheduler: &mut Scheduler) -> Vec<FleetEvent> {
        let ghosts: Vec<UnitId> = self
            .index
            .keys()
            .copied()
            .filter(|u| ctx.world.unit(*u).is_none())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        ghosts
            .into_iter()
            .filter_map(|unit| {
                warn!(faction = %self.faction, %unit, "pruning fleet member missing from world");
                self.on_unit_removed(unit, scheduler)
            })
            .collect()
    }

    pub fn units_of_faction(&self, world: &dyn WorldView) -> Vec<UnitId> {
        world.units_of(self.faction)
    }

    /// Selectable units of other factions within `radius` of any group member
    ///
    /// Deduplicated and sorted by id.
    pub fn find_units_near(
        &self,
        group: &[UnitId],
        radius: f64,
        world: &dyn WorldView,
    ) -> Vec<UnitId> {
        let mut found = BTreeSet::new();
        for member in group {
            let Some(info) = world.unit(*member) else {
                continue;
            };
            let nearby = world.units_near(info.position, radius);
            found.extend(filter_units(
                &nearby,
                &[UnitFilter::NotOwnedBy(self.faction), UnitFilter::Selectable],
                world,
            ));
        }
        found.into_iter().collect()
    }
}
