//! Composable unit predicates
//!
//! Each filter is a pure predicate over a unit snapshot; `filter_units`
//! keeps the units matching all of them, in input order.

use std::collections::BTreeMap;

use crate::combat::CombatState;
use crate::core::types::{FactionId, UnitId};
use crate::fleet::UnitManager;
use crate::world::{UnitInfo, UnitKind, WorldView};

#[derive(Clone, Copy)]
pub enum UnitFilter<'a> {
    OwnedBy(FactionId),
    NotOwnedBy(FactionId),
    /// Owner is at war with the faction
    HostileTo(FactionId),
    /// Owner is at war with or neutral towards the faction
    NotAlliedWith(FactionId),
    OfKind(&'a [UnitKind]),
    /// Units without an entry count as idle
    InState {
        states: &'a BTreeMap<UnitId, CombatState>,
        allowed: &'a [CombatState],
    },
    NotInFleet(&'a UnitManager),
    Selectable,
    Worker,
    Pirate,
    Fighter,
}

impl UnitFilter<'_> {
    pub fn matches(&self, unit: &UnitInfo, world: &dyn WorldView) -> bool {
        match *self {
            UnitFilter::OwnedBy(faction) => unit.owner == faction,
            UnitFilter::NotOwnedBy(faction) => unit.owner != faction,
            UnitFilter::HostileTo(faction) => world.are_enemies(unit.owner, faction),
            UnitFilter::NotAlliedWith(faction) => !world.are_allies(unit.owner, faction),
            UnitFilter::OfKind(kinds) => kinds.contains(&unit.kind),
            UnitFilter::InState { states, allowed } => {
                let state = states.get(&unit.id).copied().unwrap_or_default();
                allowed.contains(&state)
            }
            UnitFilter::NotInFleet(manager) => manager.fleet_of(unit.id).is_none(),
            UnitFilter::Selectable => unit.selectable,
            UnitFilter::Worker => unit.kind.is_worker(),
            UnitFilter::Pirate => unit.kind.is_pirate(),
            UnitFilter::Fighter => unit.kind.is_fighter(),
        }
    }
}

/// Units passing every filter, order preserved; unknown units are dropped
pub fn filter_units(
    units: &[UnitId],
    filters: &[UnitFilter<'_>],
    world: &dyn WorldView,
) -> Vec<UnitId> {
    units
        .iter()
        .copied()
        .filter(|id| {
            world
                .unit(*id)
                .is_some_and(|info| filters.iter().all(|f| f.matches(&info, world)))
        })
        .collect()
}
