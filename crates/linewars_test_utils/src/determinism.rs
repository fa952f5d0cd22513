//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical configuration, seed and inputs.
//!
//! # Testing Strategy
//!
//! Line wars matches must be reproducible for replays and agent training.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`linewars_core::math::Fixed`] for
//!   every simulation value.
//!
//! - **System randomness**: Spawn rows, damage rolls and generic actions all
//!   draw from the match's seeded `ChaCha8Rng`.
//!
//! - **Update order**: Player one always updates before player two.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component determinism (combat rolls, spawns)
//! 2. **Property tests**: Random input scripts must still replay identically
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N matches in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use linewars_core::simulation::Match;

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
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
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

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick, given the tick index
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use linewars_test_utils::determinism::verify_determinism;
/// use linewars_test_utils::fixtures::{new_match, scripted_tick, small_config};
///
/// let result = verify_determinism(
///     3,
///     100,
///     || new_match(small_config(), 5),
///     scripted_tick,
///     |game| game.state_hash(),
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
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
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

/// Run a match twice with the same driver and compare final hashes.
pub fn verify_match_determinism<F, D>(setup_fn: F, drive: D, num_ticks: u64) -> bool
where
    F: Fn() -> Match,
    D: Fn(&mut Match, u64),
{
    verify_determinism(2, num_ticks, setup_fn, drive, Match::state_hash).is_deterministic
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Number of ticks each match ran.
    pub ticks: u64,
}

impl ParallelRunResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F, D>(
    setup_fn: F,
    drive: D,
    num_matches: usize,
    num_ticks: u64,
) -> ParallelRunResult
where
    F: Fn() -> Match + Sync,
    D: Fn(&mut Match, u64) + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for tick in 0..num_ticks {
                        drive(&mut game, tick);
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(tick)` at the first tick whose
/// hashes differ.
pub fn find_first_divergence<F, D>(setup_fn: F, drive: D, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Match,
    D: Fn(&mut Match, u64),
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 0..num_ticks {
        drive(&mut a, tick);
        drive(&mut b, tick);

        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick = tick + 1, "Matches diverged");
            return Some(tick + 1);
        }
    }

    None
}

/// Verify that a snapshot round-trip preserves the match exactly, including
/// how it continues afterwards.
pub fn verify_serialization_determinism<F, D>(setup_fn: F, drive: D, num_ticks: u64) -> bool
where
    F: Fn() -> Match,
    D: Fn(&mut Match, u64),
{
    let mut game = setup_fn();
    for tick in 0..num_ticks {
        drive(&mut game, tick);
    }

    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Match::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    for tick in num_ticks..num_ticks * 2 {
        drive(&mut game, tick);
        drive(&mut restored, tick);
    }
    restored.state_hash() == game.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible controller input for
/// property-based testing.
pub mod strategies {
    use linewars_core::action::{Action, ACTION_COUNT};
    use linewars_core::components::PlayerId;
    use proptest::prelude::*;

    /// Either player.
    pub fn arb_player() -> impl Strategy<Value = PlayerId> {
        prop_oneof![Just(PlayerId::One), Just(PlayerId::Two)]
    }

    /// A raw `(action_index, intensity)` pair inside the action space.
    pub fn arb_raw_action() -> impl Strategy<Value = (u32, f64)> {
        (0..ACTION_COUNT, 0.0f64..=1.0)
    }

    /// An intensity that may fall outside `[0, 1]`.
    pub fn arb_wild_intensity() -> impl Strategy<Value = f64> {
        prop_oneof![
            -5.0f64..5.0,
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]
    }

    /// A decoded action for a lane of `width x height` with the given
    /// template table sizes.
    pub fn arb_action(
        width: u32,
        height: u32,
        units: usize,
        buildings: usize,
    ) -> impl Strategy<Value = Action> {
        prop_oneof![
            (0..width).prop_map(Action::MoveCursorX),
            (0..height).prop_map(Action::MoveCursorY),
            (0..units).prop_map(Action::SpawnUnit),
            (0..buildings).prop_map(Action::Build),
        ]
    }

    /// A per-tick script: at most one raw action per tick.
    pub fn arb_script(ticks: usize) -> impl Strategy<Value = Vec<Option<(PlayerId, u32, f64)>>> {
        prop::collection::vec(
            prop::option::of((arb_player(), arb_raw_action()).prop_map(|(p, (i, x))| (p, i, x))),
            ticks,
        )
    }

    /// A match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{new_match, scripted_tick, small_config};

    #[test]
    fn test_verify_determinism_same_seed() {
        let result = verify_determinism(
            3,
            150,
            || new_match(small_config(), 21),
            scripted_tick,
            Match::state_hash,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_detects_divergence() {
        let result = verify_determinism(2, 1, || 0u64, |s, _| *s += 1, |s| *s);
        assert!(result.is_deterministic);

        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_, _| {},
            |s| *s,
        );
        assert!(!result.is_deterministic);
    }

    #[test]
    fn test_no_divergence_between_identical_matches() {
        assert_eq!(
            find_first_divergence(|| new_match(small_config(), 8), scripted_tick, 120),
            None
        );
    }

    #[test]
    fn test_parallel_matches_agree() {
        let result = run_parallel_matches(|| new_match(small_config(), 3), scripted_tick, 4, 100);
        assert!(result.is_deterministic());
        assert_eq!(result.hashes.len(), 4);
    }

    #[test]
    fn test_snapshot_continues_identically() {
        assert!(verify_serialization_determinism(
            || new_match(small_config(), 17),
            scripted_tick,
            60
        ));
    }
}
