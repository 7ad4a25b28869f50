use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::models::{ConditionStore, TrialSpec};

const DEFAULT_MAX_SHUFFLE_ATTEMPTS: u32 = 50;

/// Randomized titration schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSequence {
    pub entries: Vec<TrialSpec>,
    /// Shuffles performed before a valid order was found or the fallback ran
    pub shuffle_attempts: u32,
    /// Whether nearest-valid placement produced the order
    pub used_fallback: bool,
    /// Adjacent entries sharing a condition id (non-zero only when no valid
    /// order exists)
    pub adjacent_repeats: usize,
}

impl TrialSequence {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrialSpec> {
        self.entries.iter()
    }
}

/// Builds the per-session sequence of titration trials
///
/// Every non-filler condition appears `repeats_per_condition` times. The
/// order is a uniform shuffle, reshuffled while two neighbours share a
/// condition id. When the attempt limit runs out, entries are placed one at
/// a time, each taking the nearest remaining entry (in shuffled order) that
/// differs from its predecessor and still leaves a valid arrangement for the
/// rest.
#[derive(Debug, Clone)]
pub struct TrialSequencer {
    max_shuffle_attempts: u32,
}

impl Default for TrialSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialSequencer {
    pub const fn new() -> Self {
        Self {
            max_shuffle_attempts: DEFAULT_MAX_SHUFFLE_ATTEMPTS,
        }
    }

    pub const fn with_max_shuffle_attempts(max_shuffle_attempts: u32) -> Self {
        Self {
            max_shuffle_attempts,
        }
    }

    pub fn build_sequence<R: Rng + ?Sized>(
        &self,
        conditions: &ConditionStore,
        repeats_per_condition: u32,
        rng: &mut R,
    ) -> TrialSequence {
        let mut ids: Vec<String> = conditions
            .titration_conditions()
            .flat_map(|c| std::iter::repeat_n(c.id.clone(), repeats_per_condition as usize))
            .collect();

        let mut attempts = 0;
        let mut used_fallback = false;

        if ids.len() > 1 {
            loop {
                ids.shuffle(rng);
                attempts += 1;
                if count_adjacent_repeats(&ids) == 0 {
                    break;
                }
                if attempts >= self.max_shuffle_attempts {
                    ids = place_nearest_valid(ids);
                    used_fallback = true;
                    break;
                }
            }
        }

        let adjacent_repeats = count_adjacent_repeats(&ids);
        if adjacent_repeats > 0 {
            warn!(
                entries = ids.len(),
                adjacent_repeats,
                "no order avoids consecutive repeats; proceeding with best-effort sequence"
            );
        }

        debug!(
            entries = ids.len(),
            attempts,
            used_fallback,
            "titration sequence built"
        );

        TrialSequence {
            entries: ids
                .into_iter()
                .enumerate()
                .map(|(position, condition_id)| TrialSpec {
                    position,
                    condition_id,
                })
                .collect(),
            shuffle_attempts: attempts,
            used_fallback,
            adjacent_repeats,
        }
    }
}

/// Number of neighbouring pairs with equal ids.
pub fn count_adjacent_repeats<T: PartialEq>(ids: &[T]) -> usize {
    ids.windows(2).filter(|w| w[0] == w[1]).count()
}

/// Re-place `shuffled` greedily, preferring the earliest remaining entry that
/// differs from the previous one and keeps the remainder arrangeable.
fn place_nearest_valid(shuffled: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for id in &shuffled {
        *counts.entry(id.clone()).or_insert(0) += 1;
    }

    let mut pool = shuffled;
    let mut placed: Vec<String> = Vec::with_capacity(pool.len());

    while !pool.is_empty() {
        let prev = placed.last();
        let differs = |id: &String| prev != Some(id);

        let idx = pool
            .iter()
            .position(|id| differs(id) && remainder_arrangeable(&counts, pool.len() - 1, id))
            .or_else(|| pool.iter().position(differs))
            .unwrap_or(0);

        let id = pool.remove(idx);
        if let Some(count) = counts.get_mut(&id) {
            *count -= 1;
        }
        placed.push(id);
    }

    placed
}

/// Whether the entries left after placing `last` can be ordered with no
/// adjacent repeats and without starting with `last`.
fn remainder_arrangeable(counts: &HashMap<String, usize>, remaining: usize, last: &String) -> bool {
    counts.iter().all(|(id, &count)| {
        let count = if id == last { count - 1 } else { count };
        if id == last {
            count <= remaining / 2
        } else {
            count <= remaining.div_ceil(2)
        }
    })
}
