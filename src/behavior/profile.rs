//! Behavior profiles
//!
//! A profile is a faction's personality: the weight of every component in
//! every category. One is drawn per faction at creation.

use rand::RngCore;
use tracing::info;

use crate::behavior::components::{
    Aggressive, Behavior, BreakDiplomacy, Coward, DiplomacyPeaceful, DiplomacyWarlike, DoNothing,
    FleetPatrol, PirateHater, PirateRaider, PirateRoutine, StrategyPirate, StrategyRegular,
};
use crate::behavior::manager::weighted_index;
use crate::behavior::{ActionBucket, Category, StrategyBucket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    PirateHater,
    Aggressive,
    Coward,
    BreakDiplomacy,
    DoNothing,
    FleetPatrol,
    PirateRaider,
    PirateRoutine,
    StrategyRegular,
    StrategyPirate,
    DiplomacyPeaceful,
    DiplomacyWarlike,
}

impl ComponentKind {
    pub fn build(&self) -> Box<dyn Behavior> {
        match self {
            ComponentKind::PirateHater => Box::new(PirateHater),
            ComponentKind::Aggressive => Box::new(Aggressive),
            ComponentKind::Coward => Box::new(Coward),
            ComponentKind::BreakDiplomacy => Box::new(BreakDiplomacy),
            ComponentKind::DoNothing => Box::new(DoNothing),
            ComponentKind::FleetPatrol => Box::new(FleetPatrol),
            ComponentKind::PirateRaider => Box::new(PirateRaider),
            ComponentKind::PirateRoutine => Box::new(PirateRoutine),
            ComponentKind::StrategyRegular => Box::new(StrategyRegular),
            ComponentKind::StrategyPirate => Box::new(StrategyPirate),
            ComponentKind::DiplomacyPeaceful => Box::new(DiplomacyPeaceful),
            ComponentKind::DiplomacyWarlike => Box::new(DiplomacyWarlike),
        }
    }
}

/// (category, component, weight) in registration order
pub type ProfileEntry = (Category, ComponentKind, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorProfile {
    pub name: &'static str,
    pub entries: Vec<ProfileEntry>,
}

const OFFENSIVE: Category = Category::Action(ActionBucket::Offensive);
const DEFENSIVE: Category = Category::Action(ActionBucket::Defensive);
const IDLE: Category = Category::Action(ActionBucket::Idle);
const STRATEGY: Category = Category::Strategy(StrategyBucket::Offensive);
const DIPLOMATIC: Category = Category::Strategy(StrategyBucket::Diplomatic);

impl BehaviorProfile {
    pub fn aggressive() -> Self {
        use ComponentKind::*;
        Self {
            name: "aggressive",
            entries: vec![
                (OFFENSIVE, PirateHater, 1.0),
                (OFFENSIVE, Aggressive, 1.0),
                (OFFENSIVE, Coward, 0.1),
                (OFFENSIVE, BreakDiplomacy, 0.3),
                (OFFENSIVE, DoNothing, 0.1),
                (DEFENSIVE, DoNothing, 0.8),
                (DEFENSIVE, Coward, 0.2),
                (IDLE, DoNothing, 0.5),
                (IDLE, FleetPatrol, 1.0),
                (STRATEGY, StrategyRegular, 1.0),
                (DIPLOMATIC, DiplomacyWarlike, 0.8),
                (DIPLOMATIC, DiplomacyPeaceful, 0.2),
            ],
        }
    }

    pub fn balanced() -> Self {
        use ComponentKind::*;
        Self {
            name: "balanced",
            entries: vec![
                (OFFENSIVE, PirateHater, 1.0),
                (OFFENSIVE, Aggressive, 0.5),
                (OFFENSIVE, Coward, 0.3),
                (OFFENSIVE, BreakDiplomacy, 0.05),
                (OFFENSIVE, DoNothing, 0.3),
                (DEFENSIVE, DoNothing, 0.5),
                (DEFENSIVE, Coward, 0.5),
                (IDLE, DoNothing, 1.0),
                (IDLE, FleetPatrol, 0.5),
                (STRATEGY, StrategyRegular, 1.0),
                (DIPLOMATIC, DiplomacyWarlike, 0.4),
                (DIPLOMATIC, DiplomacyPeaceful, 0.6),
            ],
        }
    }

    pub fn cautious() -> Self {
        use ComponentKind::*;
        Self {
            name: "cautious",
            entries: vec![
                (OFFENSIVE, PirateHater, 0.6),
                (OFFENSIVE, Aggressive, 0.2),
                (OFFENSIVE, Coward, 1.0),
                (OFFENSIVE, DoNothing, 0.5),
                (DEFENSIVE, DoNothing, 0.2),
                (DEFENSIVE, Coward, 0.8),
                (IDLE, DoNothing, 1.0),
                (IDLE, FleetPatrol, 0.2),
                (STRATEGY, StrategyRegular, 1.0),
                (DIPLOMATIC, DiplomacyWarlike, 0.1),
                (DIPLOMATIC, DiplomacyPeaceful, 0.9),
            ],
        }
    }

    pub fn raider() -> Self {
        use ComponentKind::*;
        Self {
            name: "raider",
            entries: vec![
                (OFFENSIVE, PirateRaider, 1.0),
                (OFFENSIVE, Aggressive, 0.4),
                (OFFENSIVE, Coward, 0.4),
                (OFFENSIVE, DoNothing, 0.1),
                (DEFENSIVE, DoNothing, 0.6),
                (DEFENSIVE, Coward, 0.4),
                (IDLE, PirateRoutine, 1.0),
                (STRATEGY, StrategyPirate, 1.0),
            ],
        }
    }

    pub fn skulker() -> Self {
        use ComponentKind::*;
        Self {
            name: "skulker",
            entries: vec![
                (OFFENSIVE, PirateRaider, 0.6),
                (OFFENSIVE, Aggressive, 0.1),
                (OFFENSIVE, Coward, 1.0),
                (OFFENSIVE, DoNothing, 0.3),
                (DEFENSIVE, DoNothing, 0.3),
                (DEFENSIVE, Coward, 0.7),
                (IDLE, PirateRoutine, 1.0),
                (STRATEGY, StrategyPirate, 1.0),
            ],
        }
    }

    /// Draw a personality; the RNG is only consumed once
    pub fn draw(pirate: bool, rng: &mut dyn RngCore) -> Self {
        let candidates: Vec<(Self, f64)> = if pirate {
            vec![(Self::raider(), 0.6), (Self::skulker(), 0.4)]
        } else {
            vec![
                (Self::aggressive(), 0.3),
                (Self::balanced(), 0.5),
                (Self::cautious(), 0.2),
            ]
        };
        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();
        let index = weighted_index(&weights, 0.0, rng).unwrap_or(0);
        let profile = candidates.into_iter().nth(index).map(|(p, _)| p);
        let profile = profile.unwrap_or_else(Self::balanced);
        info!(profile = profile.name, pirate, "drew behavior profile");
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_is_deterministic() {
        let a = BehaviorProfile::draw(false, &mut ChaCha8Rng::seed_from_u64(7));
        let b = BehaviorProfile::draw(false, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pirate_profiles_only_use_pirate_strategy() {
        for seed in 0..20 {
            let profile = BehaviorProfile::draw(true, &mut ChaCha8Rng::seed_from_u64(seed));
            assert!(profile
                .entries
                .iter()
                .all(|(_, kind, _)| *kind != ComponentKind::StrategyRegular));
        }
    }

    #[test]
    fn test_components_cover_their_category_situations() {
        for profile in [
            BehaviorProfile::aggressive(),
            BehaviorProfile::balanced(),
            BehaviorProfile::cautious(),
            BehaviorProfile::raider(),
            BehaviorProfile::skulker(),
        ] {
            for (_, kind, weight) in &profile.entries {
                assert!(*weight >= 0.0);
                assert!(!kind.build().situations().is_empty());
            }
        }
    }
}
