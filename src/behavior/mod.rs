//! Behavior selection
//!
//! Each faction owns a [`BehaviorManager`] holding behavior components
//! sorted into categories. When a manager asks "what now?" for a situation,
//! every component able to respond is scored as
//! `profile weight * certainty(situation)` and one is drawn by weighted
//! random selection from the faction's seeded RNG. The winner's response is
//! returned as a [`Decision`] that the calling manager carries out.

pub mod certainty;
pub mod components;
pub mod manager;
pub mod profile;

pub use certainty::CertaintyFn;
pub use components::Behavior;
pub use manager::{weighted_index, BehaviorManager};
pub use profile::{BehaviorProfile, ComponentKind};

use crate::core::config::AiConfig;
use crate::core::types::{FactionId, MissionId, Point, UnitId};
use crate::mission::MissionPlan;
use crate::strategy::balance::FactionBalance;
use crate::world::{Relation, WorldView};

/// Situation buckets for unit-level actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionBucket {
    Offensive,
    Defensive,
    Idle,
}

/// Situation buckets for faction-level strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyBucket {
    Offensive,
    Diplomatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Action(ActionBucket),
    Strategy(StrategyBucket),
}

/// Closed set of situations a component can respond to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SituationKind {
    FightingShipsInSight,
    PirateShipsInSight,
    WorkingShipsInSight,
    TradingShipsInSight,
    NoOneInSight,
    HostilePlayer,
    NeutralPlayer,
    AlliedPlayer,
    PlayerSharesIsland,
    PirateRoutine,
}

impl SituationKind {
    pub fn name(&self) -> &'static str {
        match self {
            SituationKind::FightingShipsInSight => "fighting_ships_in_sight",
            SituationKind::PirateShipsInSight => "pirate_ships_in_sight",
            SituationKind::WorkingShipsInSight => "working_ships_in_sight",
            SituationKind::TradingShipsInSight => "trading_ships_in_sight",
            SituationKind::NoOneInSight => "no_one_in_sight",
            SituationKind::HostilePlayer => "hostile_player",
            SituationKind::NeutralPlayer => "neutral_player",
            SituationKind::AlliedPlayer => "allied_player",
            SituationKind::PlayerSharesIsland => "player_shares_island",
            SituationKind::PirateRoutine => "pirate_routine",
        }
    }
}

impl std::fmt::Display for SituationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Own ships with foreign ships nearby
#[derive(Debug, Clone, PartialEq)]
pub struct CombatSituation {
    pub kind: SituationKind,
    pub ship_group: Vec<UnitId>,
    pub enemies: Vec<UnitId>,
    pub power_balance: f64,
    /// Mission owning `ship_group`, if any
    pub mission: Option<MissionId>,
}

/// A lone idle ship with nothing in sight
#[derive(Debug, Clone, PartialEq)]
pub struct IdleSituation {
    pub ship_group: Vec<UnitId>,
    /// Idle, fleet-free ships close to the group (the group included)
    pub companions: Vec<UnitId>,
}

/// A condition fired against other factions
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySituation {
    pub kind: SituationKind,
    pub targets: Vec<FactionId>,
    pub idle_ships: Vec<UnitId>,
}

/// Periodic relation review against one faction
#[derive(Debug, Clone, PartialEq)]
pub struct DiplomacySituation {
    pub kind: SituationKind,
    pub target: FactionId,
    pub relation: Relation,
    pub balance: FactionBalance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Situation {
    Combat(CombatSituation),
    Idle(IdleSituation),
    Strategy(StrategySituation),
    Diplomacy(DiplomacySituation),
}

impl Situation {
    pub fn kind(&self) -> SituationKind {
        match self {
            Situation::Combat(s) => s.kind,
            Situation::Idle(_) => SituationKind::NoOneInSight,
            Situation::Strategy(s) => s.kind,
            Situation::Diplomacy(s) => s.kind,
        }
    }
}

/// What a selection call sees
pub struct Environment<'a> {
    pub faction: FactionId,
    pub world: &'a dyn WorldView,
    pub config: &'a AiConfig,
    pub situation: &'a Situation,
}

impl<'a> Environment<'a> {
    pub fn new(
        faction: FactionId,
        world: &'a dyn WorldView,
        config: &'a AiConfig,
        situation: &'a Situation,
    ) -> Self {
        Self {
            faction,
            world,
            config,
            situation,
        }
    }

    /// # Panics
    /// If the situation is not a combat situation; a component registered
    /// a combat-only certainty or handler for another situation.
    pub fn combat(&self) -> &'a CombatSituation {
        match self.situation {
            Situation::Combat(s) => s,
            other => panic!("{} is not a combat situation", other.kind()),
        }
    }

    /// # Panics
    /// If the situation is not an idle situation.
    pub fn idle(&self) -> &'a IdleSituation {
        match self.situation {
            Situation::Idle(s) => s,
            other => panic!("{} is not an idle situation", other.kind()),
        }
    }

    /// # Panics
    /// If the situation is not a strategy situation.
    pub fn strategy(&self) -> &'a StrategySituation {
        match self.situation {
            Situation::Strategy(s) => s,
            other => panic!("{} is not a strategy situation", other.kind()),
        }
    }

    /// # Panics
    /// If the situation is not a diplomacy situation.
    pub fn diplomacy(&self) -> &'a DiplomacySituation {
        match self.situation {
            Situation::Diplomacy(s) => s,
            other => panic!("{} is not a diplomacy situation", other.kind()),
        }
    }

    /// The other faction this situation is about
    pub fn opponent(&self) -> Option<FactionId> {
        match self.situation {
            Situation::Combat(s) => s
                .enemies
                .iter()
                .find_map(|id| self.world.unit(*id))
                .map(|u| u.owner),
            Situation::Strategy(s) => s.targets.first().copied(),
            Situation::Diplomacy(s) => Some(s.target),
            Situation::Idle(_) => None,
        }
    }

    pub fn home(&self) -> Option<Point> {
        self.world.faction_home(self.faction)
    }
}

/// What the selected component wants done
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Each ship attacks its paired target
    Attack { pairs: Vec<(UnitId, UnitId)> },
    /// Run for `destination`; a mission group aborts instead
    Flee { units: Vec<UnitId>, destination: Point },
    DeclareWar { target: FactionId },
    /// Sail after a target without engaging yet
    Chase { pairs: Vec<(UnitId, UnitId)> },
    ReturnHome { units: Vec<UnitId>, home: Point },
    /// Move a group together as one fleet
    Patrol { units: Vec<UnitId>, destination: Point },
    StartMission(MissionPlan),
    ChangeRelation { target: FactionId, relation: Relation },
}
