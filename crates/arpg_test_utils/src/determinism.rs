//! Determinism testing utilities.
//!
//! Provides a harness for verifying that an encounter produces identical
//! results given the same seed and the same hero actions.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **Floating-point positions**: We use fixed-point arithmetic via
//!   [`arpg_core::math::Fixed`] for everything stored between ticks.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Monsters are always processed in ascending entity id order.
//!
//! - **System randomness**: Wander timing, idle facings and fallback steps
//!   all draw from the encounter's seeded [`arpg_core::rng::CombatRng`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual operations (steps, hits, damage)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Scripted encounters are reproducible
//! 4. **Parallel tests**: Running N encounters on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arpg_core::components::Facing;
use arpg_core::encounter::Encounter;
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Encounter is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// A hero input applied before a given tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeroAction {
    /// Turn and try to step.
    Step(Facing),
    /// Turn in place.
    Face(Facing),
    /// Basic weapon attack.
    Attack,
    /// Cast an ability by id.
    Cast(String),
}

/// Hero inputs keyed by the tick before which they apply.
pub type Script = Vec<(u64, HeroAction)>;

/// Apply one hero action. Cooldown and death rejections are ignored.
pub fn apply_action(encounter: &mut Encounter, action: &HeroAction) {
    let outcome = match action {
        HeroAction::Step(facing) => {
            encounter.hero_step(*facing);
            Ok(())
        }
        HeroAction::Face(facing) => {
            encounter.face_hero(*facing);
            Ok(())
        }
        HeroAction::Attack => encounter.player_attack().map(|_| ()),
        HeroAction::Cast(id) => encounter.cast(id).map(|_| ()),
    };
    if let Err(err) = outcome {
        debug!(%err, ?action, "scripted action rejected");
    }
}

/// Run `ticks` ticks, applying `script` along the way, and return the
/// state hash after every tick.
pub fn run_script(encounter: &mut Encounter, script: &[(u64, HeroAction)], ticks: u64) -> Vec<u64> {
    let mut hashes = Vec::with_capacity(ticks as usize);
    for tick in 0..ticks {
        for (_, action) in script.iter().filter(|(at, _)| *at == tick) {
            apply_action(encounter, action);
        }
        encounter.tick();
        hashes.push(encounter.state_hash());
    }
    hashes
}

/// Run a setup multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use arpg_test_utils::determinism::verify_determinism;
/// use arpg_test_utils::fixtures::skirmish;
///
/// let result = verify_determinism(
///     3,
///     40,
///     || skirmish(11),
///     |enc| { enc.tick(); },
///     |enc| enc.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run an encounter twice with the same setup and script and compare the
/// final hashes.
pub fn verify_encounter_determinism<F>(setup_fn: F, script: &[(u64, HeroAction)], num_ticks: u64) -> bool
where
    F: Fn() -> Encounter,
{
    let mut first = setup_fn();
    let mut second = setup_fn();
    run_script(&mut first, script, num_ticks) == run_script(&mut second, script, num_ticks)
}

/// Run N encounters on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_encounters<F>(setup_fn: F, num_runs: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Encounter + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut encounter = setup_fn();
                    for _ in 0..num_ticks {
                        encounter.tick();
                    }
                    encounter.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("encounter thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` for the first tick whose hashes
/// differ (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, script: &[(u64, HeroAction)], num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Encounter,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    let a = run_script(&mut first, script, num_ticks);
    let b = run_script(&mut second, script, num_ticks);
    a.iter()
        .zip(&b)
        .position(|(x, y)| x != y)
        .map(|i| i as u64 + 1)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for combat inputs.
pub mod strategies {
    use arpg_core::components::Facing;
    use arpg_core::damage::{SkillLevels, StatBundle, WeaponType};
    use arpg_core::geometry::TileOffset;
    use arpg_core::math::{Fixed, TileCoord, Vec2Fixed};
    use proptest::prelude::*;

    use super::HeroAction;

    /// Any of the four facings.
    pub fn arb_facing() -> impl Strategy<Value = Facing> {
        prop_oneof![
            Just(Facing::Up),
            Just(Facing::Right),
            Just(Facing::Down),
            Just(Facing::Left),
        ]
    }

    /// Any weapon kind.
    pub fn arb_weapon() -> impl Strategy<Value = WeaponType> {
        prop_oneof![
            Just(WeaponType::Melee),
            Just(WeaponType::Archery),
            Just(WeaponType::Magic),
        ]
    }

    /// A fixed-point coordinate within a large map.
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-10_000i32..10_000i32).prop_map(Fixed::from_num)
    }

    /// A world position within a large map.
    pub fn arb_vec2() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// A tile coordinate.
    pub fn arb_tile() -> impl Strategy<Value = TileCoord> {
        (-200i32..200, -200i32..200).prop_map(|(x, y)| TileCoord::new(x, y))
    }

    /// A small attack pattern, authored facing up.
    pub fn arb_pattern() -> impl Strategy<Value = Vec<TileOffset>> {
        prop::collection::vec((-4i32..=4, -4i32..=4), 0..8)
    }

    /// Attacker or defender stats in a plausible range.
    pub fn arb_stats() -> impl Strategy<Value = StatBundle> {
        (0u32..500, 0u32..500, 0u32..100, 0u32..100, any::<bool>()).prop_map(
            |(power, armor, level, skill, shield)| {
                StatBundle::new(power, armor, level)
                    .with_skills(SkillLevels {
                        melee: skill,
                        archery: skill,
                        magic: skill,
                        shield: skill,
                    })
                    .with_shield(shield)
            },
        )
    }

    /// A hero action, casting only abilities named in `abilities`.
    pub fn arb_action(abilities: Vec<String>) -> impl Strategy<Value = HeroAction> {
        let casts = prop::sample::select(abilities).prop_map(HeroAction::Cast);
        prop_oneof![
            arb_facing().prop_map(HeroAction::Step),
            arb_facing().prop_map(HeroAction::Face),
            Just(HeroAction::Attack),
            casts,
        ]
    }

    /// A script of actions over `ticks` ticks.
    pub fn arb_script(abilities: Vec<String>, ticks: u64) -> impl Strategy<Value = Vec<(u64, HeroAction)>> {
        prop::collection::vec((0..ticks, arb_action(abilities)), 0..16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::skirmish;

    #[test]
    fn test_skirmish_is_deterministic() {
        let script: Script = vec![
            (0, HeroAction::Face(Facing::Left)),
            (2, HeroAction::Cast("nova".to_string())),
            (10, HeroAction::Attack),
            (20, HeroAction::Cast("frost_wave".to_string())),
        ];
        assert!(verify_encounter_determinism(|| skirmish(3), &script, 120));
        assert_eq!(find_first_divergence(|| skirmish(3), &script, 120), None);
    }

    #[test]
    fn test_parallel_runs_match() {
        run_parallel_encounters(|| skirmish(9), 4, 80).assert_deterministic();
    }

    #[test]
    fn test_counter_state_is_deterministic() {
        let result = verify_determinism(
            2,
            1,
            || 0u64,
            |n| *n += 1,
            |n| compute_hash(n),
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }
}
