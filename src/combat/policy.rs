//! Faction-specific scan rules
//!
//! Regular factions and the pirates run the same lookout and strategy
//! code; what differs is captured here as data.

use crate::behavior::SituationKind;
use crate::combat::CombatState;
use crate::core::types::FactionId;
use crate::fleet::UnitFilter;
use crate::strategy::ConditionKind;
use crate::world::UnitKind;

/// Classes of foreign ships the lookout looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyClass {
    /// Warships of any faction we are not allied with
    Fighters,
    Pirates,
    /// Merchant and fishing ships of factions we are not allied with
    Workers,
}

impl EnemyClass {
    pub fn filters(&self, faction: FactionId) -> Vec<UnitFilter<'static>> {
        match self {
            EnemyClass::Fighters => vec![UnitFilter::NotAlliedWith(faction), UnitFilter::Fighter],
            EnemyClass::Pirates => vec![UnitFilter::NotAlliedWith(faction), UnitFilter::Pirate],
            EnemyClass::Workers => vec![UnitFilter::NotAlliedWith(faction), UnitFilter::Worker],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactionPolicy {
    pub pirate: bool,
    /// Own ships that fight, patrol and crew missions
    pub fighter_kinds: &'static [UnitKind],
    /// Classes in priority order with the situation each one raises
    pub scan_classes: &'static [(EnemyClass, SituationKind)],
    /// Single ships in these states are free for lookout and missions
    pub idle_states: &'static [CombatState],
    /// Single ships in these states only report threats defensively
    pub busy_states: &'static [CombatState],
    pub conditions: &'static [ConditionKind],
}

impl FactionPolicy {
    pub fn regular() -> Self {
        Self {
            pirate: false,
            fighter_kinds: &[UnitKind::Frigate],
            scan_classes: &[
                (EnemyClass::Fighters, SituationKind::FightingShipsInSight),
                (EnemyClass::Pirates, SituationKind::PirateShipsInSight),
                (EnemyClass::Workers, SituationKind::WorkingShipsInSight),
            ],
            idle_states: &[CombatState::Idle],
            busy_states: &[],
            conditions: &[
                ConditionKind::SharingIsland,
                ConditionKind::Hostile,
                ConditionKind::Neutral,
            ],
        }
    }

    /// Pirates never fight each other and hunt merchants instead of workers
    pub fn pirate() -> Self {
        Self {
            pirate: true,
            fighter_kinds: &[UnitKind::PirateShip],
            scan_classes: &[
                (EnemyClass::Fighters, SituationKind::FightingShipsInSight),
                (EnemyClass::Workers, SituationKind::TradingShipsInSight),
            ],
            idle_states: &[CombatState::Idle],
            busy_states: &[CombatState::Chasing, CombatState::GoingHome],
            conditions: &[ConditionKind::PirateRoutinePossible],
        }
    }

    pub fn for_faction(pirate: bool) -> Self {
        if pirate {
            Self::pirate()
        } else {
            Self::regular()
        }
    }
}
