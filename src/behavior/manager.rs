//! Weighted random selection among registered components

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use tracing::debug;

use crate::behavior::certainty::CertaintyFn;
use crate::behavior::components::Behavior;
use crate::behavior::profile::BehaviorProfile;
use crate::behavior::{Category, Decision, Environment, SituationKind};
use crate::core::config::AiConfig;

/// Pick an index with probability `weights[i] / sum(weights)`
///
/// Returns `None` without touching the RNG when the sum is below
/// `epsilon`. Otherwise draws once from `[0, sum)` and returns the first
/// index whose cumulative weight exceeds the draw, so equal weights
/// resolve in slice order.
pub fn weighted_index(weights: &[f64], epsilon: f64, rng: &mut dyn RngCore) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total < epsilon || total <= 0.0 {
        return None;
    }

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > draw {
            return Some(i);
        }
    }
    // Rounding can leave the draw at the very top of the range
    weights.iter().rposition(|w| *w > 0.0)
}

struct Entry {
    behavior: Box<dyn Behavior>,
    weight: f64,
    certainties: BTreeMap<SituationKind, Box<dyn CertaintyFn>>,
}

/// Components by category, in registration order
pub struct BehaviorManager {
    profile: &'static str,
    categories: BTreeMap<Category, Vec<Entry>>,
    epsilon: f64,
}

impl std::fmt::Debug for BehaviorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorManager")
            .field("profile", &self.profile)
            .field("categories", &self.categories.len())
            .finish()
    }
}

impl BehaviorManager {
    pub fn new(epsilon: f64) -> Self {
        Self {
            profile: "custom",
            categories: BTreeMap::new(),
            epsilon,
        }
    }

    pub fn from_profile(profile: &BehaviorProfile, config: &AiConfig) -> Self {
        let mut manager = Self::new(config.behavior.selection_epsilon);
        manager.profile = profile.name;
        for (category, kind, weight) in &profile.entries {
            manager.register(*category, kind.build(), *weight, config);
        }
        manager
    }

    pub fn profile(&self) -> &'static str {
        self.profile
    }

    /// # Panics
    /// If `weight` is negative or not finite.
    pub fn register(
        &mut self,
        category: Category,
        behavior: Box<dyn Behavior>,
        weight: f64,
        config: &AiConfig,
    ) {
        assert!(
            weight.is_finite() && weight >= 0.0,
            "invalid weight {} for {}",
            weight,
            behavior.name()
        );
        let certainties = behavior
            .situations()
            .iter()
            .map(|kind| (*kind, behavior.certainty(*kind, config)))
            .collect();
        self.categories.entry(category).or_default().push(Entry {
            behavior,
            weight,
            certainties,
        });
    }

    /// Replace the certainty a registered component uses for one situation
    ///
    /// Returns false when no component of that name handles `kind` in
    /// `category`.
    pub fn set_certainty(
        &mut self,
        category: Category,
        component: &str,
        kind: SituationKind,
        certainty: Box<dyn CertaintyFn>,
    ) -> bool {
        let Some(entry) = self
            .categories
            .get_mut(&category)
            .and_then(|entries| entries.iter_mut().find(|e| e.behavior.name() == component))
        else {
            return false;
        };
        match entry.certainties.get_mut(&kind) {
            Some(slot) => {
                *slot = certainty;
                true
            }
            None => false,
        }
    }

    /// Names of the components able to respond to `kind` in `category`
    pub fn candidates(&self, category: Category, kind: SituationKind) -> Vec<&'static str> {
        self.categories
            .get(&category)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.certainties.contains_key(&kind))
                    .map(|e| e.behavior.name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pick a component for the situation and return its response
    ///
    /// # Panics
    /// If a certainty function returns a negative or non-finite value.
    pub fn select(
        &self,
        category: Category,
        env: &Environment<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<Decision> {
        let kind = env.situation.kind();
        let entries = self.categories.get(&category)?;

        let scored: Vec<(&Entry, f64)> = entries
            .iter()
            .filter_map(|entry| {
                let certainty = entry.certainties.get(&kind)?.certainty(env);
                assert!(
                    certainty.is_finite() && certainty >= 0.0,
                    "{} returned certainty {} for {}",
                    entry.behavior.name(),
                    certainty,
                    kind
                );
                Some((entry, entry.weight * certainty))
            })
            .collect();

        let weights: Vec<f64> = scored.iter().map(|(_, score)| *score).collect();
        let Some(index) = weighted_index(&weights, self.epsilon, rng) else {
            debug!(faction = %env.faction, situation = %kind, "no component applies");
            return None;
        };

        let (winner, score) = scored[index];
        debug!(
            faction = %env.faction,
            situation = %kind,
            component = winner.behavior.name(),
            score,
            "selected behavior"
        );
        winner.behavior.respond(env, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::certainty::Constant;
    use crate::behavior::{ActionBucket, IdleSituation, Situation};
    use crate::core::types::{FactionId, Point};
    use crate::sandbox::SandboxWorld;
    use crate::world::UnitKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const IDLE: Category = Category::Action(ActionBucket::Idle);

    /// Responds with a patrol to a fixed point that encodes its index
    struct Marker(usize);

    impl Behavior for Marker {
        fn name(&self) -> &'static str {
            ["m0", "m1", "m2", "m3"][self.0]
        }

        fn situations(&self) -> &'static [SituationKind] {
            &[SituationKind::NoOneInSight]
        }

        fn respond(&self, env: &Environment<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
            Some(Decision::Patrol {
                units: env.idle().ship_group.clone(),
                destination: Point::new(self.0 as f64, 0.0),
            })
        }
    }

    fn winner(decision: Option<Decision>) -> Option<usize> {
        match decision {
            Some(Decision::Patrol { destination, .. }) => Some(destination.x as usize),
            _ => None,
        }
    }

    fn fixture() -> (SandboxWorld, Situation) {
        let mut world = SandboxWorld::new(50.0, 50.0);
        world.add_faction(FactionId(1), false, Point::new(0.0, 0.0));
        let ship = world.spawn_unit(FactionId(1), UnitKind::Frigate, Point::new(5.0, 5.0), 100.0);
        let situation = Situation::Idle(IdleSituation { ship_group: vec![ship], companions: vec![ship] });
        (world, situation)
    }

    #[test]
    fn test_weighted_index_none_below_epsilon() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut untouched = rng.clone();
        assert_eq!(weighted_index(&[0.0, 1e-9, 0.0], 1e-7, &mut rng), None);
        assert_eq!(weighted_index(&[], 1e-7, &mut rng), None);
        // No draw was made
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            assert_eq!(weighted_index(&[0.0, 2.0, 0.0], 1e-7, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_selection_frequencies_converge() {
        let (world, situation) = fixture();
        let config = AiConfig::default();
        let mut manager = BehaviorManager::new(config.behavior.selection_epsilon);
        let weights = [1.0, 2.0, 0.0, 5.0];
        for (i, w) in weights.iter().enumerate() {
            manager.register(IDLE, Box::new(Marker(i)), *w, &config);
        }
        let env = Environment::new(FactionId(1), &world, &config, &situation);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let trials = 40_000;
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            let index = winner(manager.select(IDLE, &env, &mut rng)).expect("a component wins");
            counts[index] += 1;
        }

        let total: f64 = weights.iter().sum();
        for (i, w) in weights.iter().enumerate() {
            let observed = counts[i] as f64 / trials as f64;
            assert!(
                (observed - w / total).abs() < 0.01,
                "component {} picked {:.4}, expected {:.4}",
                i,
                observed,
                w / total
            );
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let (world, situation) = fixture();
        let config = AiConfig::default();
        let mut manager = BehaviorManager::new(config.behavior.selection_epsilon);
        for i in 0..3 {
            manager.register(IDLE, Box::new(Marker(i)), 1.0, &config);
        }
        let env = Environment::new(FactionId(1), &world, &config, &situation);

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|_| winner(manager.select(IDLE, &env, &mut rng)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_zero_certainty_selects_nothing() {
        let (world, situation) = fixture();
        let config = AiConfig::default();
        let mut manager = BehaviorManager::new(config.behavior.selection_epsilon);
        manager.register(IDLE, Box::new(Marker(0)), 1.0, &config);
        assert!(manager.set_certainty(IDLE, "m0", SituationKind::NoOneInSight, Box::new(Constant(0.0))));

        let env = Environment::new(FactionId(1), &world, &config, &situation);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(manager.select(IDLE, &env, &mut rng), None);
    }

    #[test]
    #[should_panic(expected = "returned certainty")]
    fn test_negative_certainty_panics() {
        let (world, situation) = fixture();
        let config = AiConfig::default();
        let mut manager = BehaviorManager::new(config.behavior.selection_epsilon);
        manager.register(IDLE, Box::new(Marker(0)), 1.0, &config);
        manager.set_certainty(IDLE, "m0", SituationKind::NoOneInSight, Box::new(Constant(-1.0)));

        let env = Environment::new(FactionId(1), &world, &config, &situation);
        manager.select(IDLE, &env, &mut ChaCha8Rng::seed_from_u64(1));
    }

    #[test]
    fn test_unregistered_category_is_noop() {
        let (world, situation) = fixture();
        let config = AiConfig::default();
        let manager = BehaviorManager::new(config.behavior.selection_epsilon);
        let env = Environment::new(FactionId(1), &world, &config, &situation);
        assert_eq!(manager.select(IDLE, &env, &mut ChaCha8Rng::seed_from_u64(1)), None);
        assert!(manager.candidates(IDLE, SituationKind::NoOneInSight).is_empty());
    }
}
