//! Fleets: groups of ships moved and tracked as one
//!
//! A fleet orders every member towards a shared destination and reports
//! arrival once enough of them are done. Ships that cannot find a path are
//! marked blocked and retried later instead of failing the whole fleet.

pub mod filters;
pub mod manager;

pub use filters::{filter_units, UnitFilter};
pub use manager::UnitManager;

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::config::FleetConfig;
use crate::core::error::MoveError;
use crate::core::types::{FleetId, MissionId, Point, UnitId};
use crate::geometry::{centroid, Shape};
use crate::schedule::{ScheduledTask, Scheduler};
use crate::world::TickContext;

/// Movement state of one member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipState {
    Idle,
    Moving,
    Blocked,
    Reached,
}

/// Aggregate movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetState {
    Idle,
    Moving,
}

/// Who gets told when the fleet arrives or dies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetOwner {
    Mission(MissionId),
    /// Short-lived group move issued by an idle behavior
    Patrol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetEvent {
    Arrived { fleet: FleetId, owner: FleetOwner },
    /// Last member lost; the fleet no longer exists
    Destroyed { fleet: FleetId, owner: FleetOwner },
}

#[derive(Debug, Clone)]
pub struct Fleet {
    id: FleetId,
    owner: FleetOwner,
    ships: BTreeMap<UnitId, ShipState>,
    state: FleetState,
    destination: Option<Shape>,
    completion_ratio: f64,
    retry_pending: bool,
    /// Arrived while the order was being issued; reported on the next drain
    arrival_unreported: bool,
}

impl Fleet {
    /// # Panics
    /// If `units` is empty.
    pub(crate) fn new(id: FleetId, owner: FleetOwner, units: &[UnitId]) -> Self {
        assert!(!units.is_empty(), "cannot create {} without ships", id);
        Self {
            id,
            owner,
            ships: units.iter().map(|u| (*u, ShipState::Idle)).collect(),
            state: FleetState::Idle,
            destination: None,
            completion_ratio: 1.0,
            retry_pending: false,
            arrival_unreported: false,
        }
    }

    pub fn id(&self) -> FleetId {
        self.id
    }

    pub fn owner(&self) -> FleetOwner {
        self.owner
    }

    pub fn size(&self) -> usize {
        self.ships.len()
    }

    pub fn units(&self) -> Vec<UnitId> {
        self.ships.keys().copied().collect()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.ships.contains_key(&unit)
    }

    pub fn state(&self) -> FleetState {
        self.state
    }

    pub fn ship_state(&self, unit: UnitId) -> Option<ShipState> {
        self.ships.get(&unit).copied()
    }

    pub fn destination(&self) -> Option<Shape> {
        self.destination
    }

    /// Members currently not moving anywhere
    pub fn idle_units(&self) -> Vec<UnitId> {
        self.ships
            .iter()
            .filter(|(_, s)| **s == ShipState::Idle)
            .map(|(u, _)| *u)
            .collect()
    }

    /// Average position of the members the world still knows
    pub fn position(&self, ctx: &TickContext<'_>) -> Option<Point> {
        let positions: Vec<Point> = ctx
            .positions(&self.units())
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        centroid(&positions)
    }

    /// Order every member towards `destination`
    ///
    /// Ships without a path are marked blocked and retried after
    /// `retry_blocked_ticks`. Fails only when no member could be ordered.
    pub fn move_to(
        &mut self,
        destination: Shape,
        completion_ratio: f64,
        config: &FleetConfig,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Result<(), MoveError> {
        assert!(
            completion_ratio > 0.0 && completion_ratio <= 1.0,
            "completion ratio {} out of (0, 1]",
            completion_ratio
        );

        let target = match destination {
            Shape::Point(center) if self.size() > 1 => Shape::circle(center, config.spread_radius),
            other => other,
        };
        self.destination = Some(target);
        self.completion_ratio = completion_ratio;
        self.arrival_unreported = false;

        let mut first_error = None;
        let mut moved = 0;
        for (unit, state) in self.ships.iter_mut() {
            match ctx.commands.move_unit(*unit, target) {
                Ok(()) => {
                    *state = ShipState::Moving;
                    moved += 1;
                }
                Err(err) => {
                    *state = ShipState::Blocked;
                    first_error.get_or_insert(err);
                }
            }
        }

        if moved == 0 {
            self.reset_ships();
            self.state = FleetState::Idle;
            self.destination = None;
            return Err(first_error.unwrap_or(MoveError::NoPath(self.units()[0])));
        }

        self.state = FleetState::Moving;
        // Blocked ships alone may already meet the ratio
        if self.check_arrival().is_some() {
            self.arrival_unreported = true;
            scheduler.schedule_once(ScheduledTask::ReportArrival(self.id), ctx.now, 0);
            return Ok(());
        }
        if first_error.is_some() {
            self.schedule_retry(config, ctx, scheduler);
        }
        Ok(())
    }

    /// The arrival `move_to` detected, unless a later order or stop replaced it
    pub(crate) fn take_unreported_arrival(&mut self) -> Option<FleetEvent> {
        if !std::mem::take(&mut self.arrival_unreported) {
            return None;
        }
        Some(FleetEvent::Arrived {
            fleet: self.id,
            owner: self.owner,
        })
    }

    /// Stop every member where it is
    pub fn stop(&mut self, ctx: &mut TickContext<'_>) {
        for unit in self.ships.keys() {
            ctx.commands.stop_unit(*unit);
        }
        self.reset_ships();
        self.state = FleetState::Idle;
        self.arrival_unreported = false;
    }

    pub(crate) fn on_ship_reached(&mut self, unit: UnitId) -> Option<FleetEvent> {
        if self.state != FleetState::Moving {
            return None;
        }
        let state = self.ships.get_mut(&unit)?;
        *state = ShipState::Reached;
        self.check_arrival()
    }

    pub(crate) fn on_ship_blocked(
        &mut self,
        unit: UnitId,
        config: &FleetConfig,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Option<FleetEvent> {
        if self.state != FleetState::Moving {
            return None;
        }
        let state = self.ships.get_mut(&unit)?;
        *state = ShipState::Blocked;
        if let Some(event) = self.check_arrival() {
            return Some(event);
        }
        self.schedule_retry(config, ctx, scheduler);
        None
    }

    /// Re-order blocked ships; no-op unless the fleet is still moving
    pub(crate) fn retry_blocked(
        &mut self,
        config: &FleetConfig,
        ctx: &mut TickContext<'_>,
        scheduler: &mut Scheduler,
    ) -> Option<FleetEvent> {
        self.retry_pending = false;
        let (FleetState::Moving, Some(target)) = (self.state, self.destination) else {
            return None;
        };

        let mut still_blocked = 0;
        for (unit, state) in self.ships.iter_mut() {
            if *state != ShipState::Blocked {
                continue;
            }
            match ctx.commands.move_unit(*unit, target) {
                Ok(()) => *state = ShipState::Moving,
                Err(_) => still_blocked += 1,
            }
        }

        debug!(fleet = %self.id, still_blocked, "retried blocked ships");
        if let Some(event) = self.check_arrival() {
            return Some(event);
        }
        if still_blocked > 0 {
            self.schedule_retry(config, ctx, scheduler);
        }
        None
    }

    /// Drop a member; the caller destroys the fleet when it returns `Destroyed`
    ///
    /// While moving, arrival is re-checked against the remaining members.
    pub(crate) fn on_member_lost(&mut self, unit: UnitId) -> Option<FleetEvent> {
        self.ships.remove(&unit)?;
        if self.ships.is_empty() {
            self.state = FleetState::Idle;
            return Some(FleetEvent::Destroyed {
                fleet: self.id,
                owner: self.owner,
            });
        }
        if self.state == FleetState::Moving {
            return self.check_arrival();
        }
        None
    }

    fn schedule_retry(
        &mut self,
        config: &FleetConfig,
        ctx: &TickContext<'_>,
        scheduler: &mut Scheduler,
    ) {
        if self.retry_pending {
            return;
        }
        self.retry_pending = true;
        scheduler.schedule_once(
            ScheduledTask::RetryBlockedShips(self.id),
            ctx.now,
            config.retry_blocked_ticks,
        );
    }

    fn target_reached(&self) -> bool {
        let done = self
            .ships
            .values()
            .filter(|s| matches!(s, ShipState::Reached | ShipState::Blocked))
            .count();
        done as f64 / self.ships.len() as f64 >= self.completion_ratio
    }

    fn check_arrival(&mut self) -> Option<FleetEvent> {
        if !self.target_reached() {
            return None;
        }
        self.state = FleetState::Idle;
        self.reset_ships();
        debug!(fleet = %self.id, "fleet reached destination");
        Some(FleetEvent::Arrived {
            fleet: self.id,
            owner: self.owner,
        })
    }

    fn reset_ships(&mut self) {
        for state in self.ships.values_mut() {
            *state = ShipState::Idle;
        }
    }
}
