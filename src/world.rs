//! Contracts with the surrounding simulation
//!
//! The decision engine never owns world state. It reads through
//! [`WorldView`], issues orders through [`CommandSink`] (so they can be
//! logged, networked or replayed uniformly) and is told about move results
//! and unit removal through [`WorldEvent`]s.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::error::MoveError;
use crate::core::types::{FactionId, Point, Tick, UnitId};
use crate::geometry::Shape;

/// Ship classes the AI distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Frigate,
    Trader,
    Fisher,
    PirateShip,
}

impl UnitKind {
    /// Regular warship
    pub fn is_fighter(&self) -> bool {
        matches!(self, UnitKind::Frigate)
    }

    /// Civilian ship (trade or fishing)
    pub fn is_worker(&self) -> bool {
        matches!(self, UnitKind::Trader | UnitKind::Fisher)
    }

    pub fn is_pirate(&self) -> bool {
        matches!(self, UnitKind::PirateShip)
    }
}

/// Read-only snapshot of a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitInfo {
    pub id: UnitId,
    pub owner: FactionId,
    pub kind: UnitKind,
    pub position: Point,
    pub health: f64,
    pub selectable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Allied,
    Neutral,
    Enemy,
}

/// Economic and territorial totals used by the balance helpers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionStats {
    pub gold: f64,
    pub inventory_value: f64,
    pub territory: f64,
    pub settlements: u32,
}

/// Island identifier as reported by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IslandId(pub u32);

/// World query service
///
/// Every list-returning method must return a stable order (ascending id)
/// so decisions stay reproducible.
pub trait WorldView {
    fn unit(&self, id: UnitId) -> Option<UnitInfo>;

    fn units_of(&self, faction: FactionId) -> Vec<UnitId>;

    /// Units whose position lies within `radius` of `position`
    fn units_near(&self, position: Point, radius: f64) -> Vec<UnitId>;

    /// All factions in a fixed order
    fn factions(&self) -> Vec<FactionId>;

    fn relation(&self, a: FactionId, b: FactionId) -> Relation;

    fn is_pirate_faction(&self, faction: FactionId) -> bool;

    fn faction_islands(&self, faction: FactionId) -> Vec<IslandId>;

    /// Warehouse area of the faction's first settlement (pirates: their base)
    fn faction_home(&self, faction: FactionId) -> Option<Point>;

    fn settlement_positions(&self, faction: FactionId) -> Vec<Point>;

    fn faction_stats(&self, faction: FactionId) -> FactionStats;

    fn random_reachable_position(&self, rng: &mut dyn RngCore) -> Option<Point>;

    fn are_enemies(&self, a: FactionId, b: FactionId) -> bool {
        a != b && self.relation(a, b) == Relation::Enemy
    }

    fn are_neutral(&self, a: FactionId, b: FactionId) -> bool {
        a != b && self.relation(a, b) == Relation::Neutral
    }

    fn are_allies(&self, a: FactionId, b: FactionId) -> bool {
        a == b || self.relation(a, b) == Relation::Allied
    }
}

/// Command/execution service
pub trait CommandSink {
    /// Order a unit to sail into `target`
    ///
    /// Fails synchronously when no path exists at call time.
    fn move_unit(&mut self, unit: UnitId, target: Shape) -> Result<(), MoveError>;

    fn stop_unit(&mut self, unit: UnitId);

    fn attack(&mut self, unit: UnitId, target: UnitId);

    fn set_relation(&mut self, a: FactionId, b: FactionId, relation: Relation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Reached,
    /// The unit got stuck after the order was accepted
    Blocked,
}

/// Notifications the world delivers to the owning faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    MoveFinished { unit: UnitId, outcome: MoveOutcome },
    UnitRemoved { unit: UnitId },
}

/// Everything a manager needs from the outside during one tick
pub struct TickContext<'a> {
    pub now: Tick,
    pub world: &'a dyn WorldView,
    pub commands: &'a mut dyn CommandSink,
}

impl<'a> TickContext<'a> {
    pub fn new(now: Tick, world: &'a dyn WorldView, commands: &'a mut dyn CommandSink) -> Self {
        Self {
            now,
            world,
            commands,
        }
    }

    /// Positions of the units that still exist, in input order
    pub fn positions(&self, units: &[UnitId]) -> Vec<(UnitId, Point)> {
        units
            .iter()
            .filter_map(|id| self.world.unit(*id).map(|u| (*id, u.position)))
            .collect()
    }

    pub fn healths(&self, units: &[UnitId]) -> Vec<f64> {
        units
            .iter()
            .filter_map(|id| self.world.unit(*id).map(|u| u.health))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_kind_classes() {
        assert!(UnitKind::Frigate.is_fighter());
        assert!(!UnitKind::PirateShip.is_fighter());
        assert!(UnitKind::Trader.is_worker());
        assert!(UnitKind::Fisher.is_worker());
        assert!(UnitKind::PirateShip.is_pirate());
    }
}
