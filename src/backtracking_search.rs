//! Backtracking search over the arc-consistent domains. Slots are chosen by minimum remaining
//! values with the degree heuristic as a tiebreaker, and each slot's candidates are tried in
//! least-constraining-value order.

use instant::{Duration, Instant};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use crate::arc_consistency::{ac3, enforce_node_consistency};
use crate::domains::{DomainStore, GlyphCounts};
use crate::grid_config::{render_grid, GridConfig, Slot, SlotId};
use crate::word_list::WordId;
use crate::CHECK_INVARIANTS;

/// A (possibly partial) mapping from slots to the words chosen for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    word_ids: BTreeMap<SlotId, WordId>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Assignment {
        Assignment::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.word_ids.contains_key(&slot_id)
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.get(&slot_id).copied()
    }

    /// Assign a word to a slot, returning whatever was there before.
    pub fn insert(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        self.word_ids.insert(slot_id, word_id)
    }

    pub fn remove(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.remove(&slot_id)
    }

    /// Assigned `(slot, word)` pairs in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.word_ids.iter().map(|(&slot_id, &word_id)| (slot_id, word_id))
    }

    #[must_use]
    pub fn word<'a>(&self, config: &'a GridConfig, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id)
            .map(|word_id| config.word(word_id).string.as_str())
    }

    /// The assignment keyed by slot geometry, with the words spelled out.
    #[must_use]
    pub fn words(&self, config: &GridConfig) -> BTreeMap<Slot, String> {
        self.iter()
            .map(|(slot_id, word_id)| (*config.slot(slot_id), config.word(word_id).string.clone()))
            .collect()
    }
}

/// Limits on how much work a fill may do before giving up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    pub max_states: Option<u64>,
    pub timeout: Option<Duration>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub eliminations: usize,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillFailure {
    /// No assignment satisfies the grid, either because arc consistency emptied a domain or
    /// because the search tried everything.
    #[error("no solution")]
    NoSolution,

    #[error("search budget exhausted after {states} states")]
    BudgetExceeded { states: u64 },
}

/// Is every slot in the grid assigned?
#[must_use]
pub fn assignment_complete(config: &GridConfig, assignment: &Assignment) -> bool {
    assignment.len() == config.slot_count()
}

/// Check the whole assignment: words are distinct, each word fits its slot, and every pair of
/// assigned slots agrees on its shared cell.
#[must_use]
pub fn consistent(config: &GridConfig, assignment: &Assignment) -> bool {
    let mut seen: HashSet<WordId> = HashSet::with_capacity(assignment.len());
    if !assignment.iter().all(|(_, word_id)| seen.insert(word_id)) {
        return false;
    }

    for (slot_id, word_id) in assignment.iter() {
        if config.word(word_id).len() != config.slot(slot_id).length {
            return false;
        }
    }

    assignment
        .iter()
        .all(|(slot_id, _)| neighbors_agree(config, assignment, slot_id))
}

/// Does the word in `slot_id` match every assigned neighbor at their shared cell? Both words are
/// assumed to fit their slots.
fn neighbors_agree(config: &GridConfig, assignment: &Assignment, slot_id: SlotId) -> bool {
    let word = match assignment.get(slot_id) {
        Some(word_id) => config.word(word_id),
        None => return true,
    };

    config.neighbors(slot_id).iter().all(|&other_slot_id| {
        let (overlap, other_word_id) = match (
            config.overlap(slot_id, other_slot_id),
            assignment.get(other_slot_id),
        ) {
            (Some(overlap), Some(other_word_id)) => (overlap, other_word_id),
            _ => return true,
        };

        word.glyphs[overlap.cell] == config.word(other_word_id).glyphs[overlap.other_cell]
    })
}

/// Check only the constraints involving `slot_id`, assuming the rest of the assignment was
/// already consistent.
fn consistent_extension(config: &GridConfig, assignment: &Assignment, slot_id: SlotId) -> bool {
    let word_id = match assignment.get(slot_id) {
        Some(word_id) => word_id,
        None => return true,
    };

    config.word(word_id).len() == config.slot(slot_id).length
        && !assignment
            .iter()
            .any(|(other_slot_id, other_word_id)| {
                other_slot_id != slot_id && other_word_id == word_id
            })
        && neighbors_agree(config, assignment, slot_id)
}

/// Pick the unassigned slot with the fewest remaining candidates, preferring slots with more
/// neighbors and then lower ids.
#[must_use]
pub fn select_unassigned_variable(
    config: &GridConfig,
    domains: &DomainStore,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.contains(slot_id))
        .min_by_key(|&slot_id| {
            (
                domains.len(slot_id),
                Reverse(config.neighbors(slot_id).len()),
                slot_id,
            )
        })
}

/// Return the slot's candidates ordered by how many candidates each would rule out for the
/// slot's unassigned neighbors, fewest first. Ties keep ascending `WordId` order.
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    domains: &DomainStore,
    slot_id: SlotId,
    assignment: &Assignment,
) -> Vec<WordId> {
    // For each unassigned neighbor: which of our cells it shares, how many candidates it has,
    // and how many of those put each glyph in the shared cell.
    let crossing_counts: Vec<(usize, usize, GlyphCounts)> = config
        .neighbors(slot_id)
        .iter()
        .filter(|&&other_slot_id| !assignment.contains(other_slot_id))
        .filter_map(|&other_slot_id| {
            let overlap = config.overlap(slot_id, other_slot_id)?;
            Some((
                overlap.cell,
                domains.len(other_slot_id),
                domains.glyph_counts(config, other_slot_id, overlap.other_cell),
            ))
        })
        .collect();

    let mut values: Vec<(usize, WordId)> = domains
        .iter(slot_id)
        .map(|word_id| {
            let word = config.word(word_id);
            let ruled_out: usize = crossing_counts
                .iter()
                .map(|(cell, option_count, glyph_counts)| match word.glyphs.get(*cell) {
                    Some(&glyph) => option_count - glyph_counts[glyph] as usize,
                    None => *option_count,
                })
                .sum();
            (ruled_out, word_id)
        })
        .collect();

    values.sort_by_key(|&(ruled_out, _)| ruled_out);

    values.into_iter().map(|(_, word_id)| word_id).collect()
}

enum SearchOutcome {
    Found,
    Exhausted,
    OutOfBudget,
}

/// State shared across one recursive search.
struct Search<'a> {
    config: &'a GridConfig,
    domains: &'a DomainStore,
    solver_config: &'a SolverConfig,
    statistics: Statistics,
    start: Instant,
}

impl<'a> Search<'a> {
    fn new(
        config: &'a GridConfig,
        domains: &'a DomainStore,
        solver_config: &'a SolverConfig,
    ) -> Search<'a> {
        Search {
            config,
            domains,
            solver_config,
            statistics: Statistics::default(),
            start: Instant::now(),
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.solver_config
            .max_states
            .map_or(false, |max_states| self.statistics.states > max_states)
            || self
                .solver_config
                .timeout
                .map_or(false, |timeout| self.start.elapsed() >= timeout)
    }

    fn backtrack(&mut self, assignment: &mut Assignment) -> SearchOutcome {
        if assignment_complete(self.config, assignment) {
            return SearchOutcome::Found;
        }

        self.statistics.states += 1;
        if self.budget_exhausted() {
            return SearchOutcome::OutOfBudget;
        }

        let slot_id = match select_unassigned_variable(self.config, self.domains, assignment) {
            Some(slot_id) => slot_id,
            None => return SearchOutcome::Found,
        };

        log::trace!(
            "State {}: filling {:?} ({} options)\n{}",
            self.statistics.states,
            self.config.slot(slot_id),
            self.domains.len(slot_id),
            render_grid(self.config, assignment),
        );

        for word_id in order_domain_values(self.config, self.domains, slot_id, assignment) {
            assignment.insert(slot_id, word_id);

            if consistent_extension(self.config, assignment, slot_id) {
                if CHECK_INVARIANTS {
                    assert!(
                        consistent(self.config, assignment),
                        "Inconsistent assignment after filling {:?}",
                        self.config.slot(slot_id),
                    );
                }

                match self.backtrack(assignment) {
                    SearchOutcome::Found => return SearchOutcome::Found,
                    SearchOutcome::OutOfBudget => {
                        assignment.remove(slot_id);
                        return SearchOutcome::OutOfBudget;
                    }
                    SearchOutcome::Exhausted => {
                        self.statistics.backtracks += 1;
                    }
                }
            }

            assignment.remove(slot_id);
        }

        SearchOutcome::Exhausted
    }
}

/// Extend `assignment` to a complete, consistent assignment using the given domains, with no
/// search budget. Returns whether it succeeded; on failure `assignment` is left as it was.
pub fn backtrack(config: &GridConfig, domains: &DomainStore, assignment: &mut Assignment) -> bool {
    let solver_config = SolverConfig::default();
    let mut search = Search::new(config, domains, &solver_config);

    matches!(search.backtrack(assignment), SearchOutcome::Found)
}

/// Enforce node and arc consistency on `domains`, then search for a complete assignment.
pub fn find_fill(
    config: &GridConfig,
    mut domains: DomainStore,
    solver_config: &SolverConfig,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    let node_eliminations = enforce_node_consistency(config, &mut domains);
    let arc_consistency = match ac3(config, &mut domains, None) {
        Ok(success) => success,
        Err(failure) => {
            log::info!(
                "No solution: {:?} has no candidates left after arc consistency",
                config.slot(failure.emptied_slot_id)
            );
            return Err(FillFailure::NoSolution);
        }
    };

    let mut search = Search::new(config, &domains, solver_config);
    search.statistics.revisions = arc_consistency.revisions;
    search.statistics.eliminations = node_eliminations + arc_consistency.eliminations;

    let mut assignment = Assignment::new();
    let outcome = search.backtrack(&mut assignment);
    let mut statistics = search.statistics;
    statistics.duration = start.elapsed();

    match outcome {
        SearchOutcome::Found => {
            log::info!("Found a fill: {statistics:?}");
            Ok(FillSuccess {
                statistics,
                assignment,
            })
        }
        SearchOutcome::Exhausted => {
            log::info!("No solution after exhausting the search: {statistics:?}");
            Err(FillFailure::NoSolution)
        }
        SearchOutcome::OutOfBudget => {
            log::warn!("Gave up after reaching the search budget: {statistics:?}");
            Err(FillFailure::BudgetExceeded {
                states: statistics.states,
            })
        }
    }
}

/// Fill the grid starting from every word in every slot, with no search budget. Returns `None`
/// if there's no solution.
#[must_use]
pub fn solve(config: &GridConfig) -> Option<Assignment> {
    find_fill(config, DomainStore::new(config), &SolverConfig::default())
        .ok()
        .map(|success| success.assignment)
}
