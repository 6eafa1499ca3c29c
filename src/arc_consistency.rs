//! Node and arc consistency for the slot domains. Both passes only ever remove candidates, so
//! running them before the search never rules out a valid fill.

use bit_set::BitSet;
use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::grid_config::{GridConfig, SlotId};

/// An ordered pair of slots `(x, y)`: checking it makes `x` consistent with `y`.
pub type SlotArc = (SlotId, SlotId);

/// Remove every candidate whose length differs from its slot's length, returning how many were
/// removed.
pub fn enforce_node_consistency(config: &GridConfig, domains: &mut DomainStore) -> usize {
    let mut removed = 0;

    for (slot_id, slot) in config.slots.iter().enumerate() {
        removed += domains.retain(slot_id, |word_id| config.word(word_id).len() == slot.length);
    }

    log::debug!("Node consistency removed {removed} candidates");

    removed
}

/// Make slot `x` arc consistent with slot `y`, returning how many candidates were removed from
/// `x`.
fn revise_impl(config: &GridConfig, domains: &mut DomainStore, x: SlotId, y: SlotId) -> usize {
    let overlap = match config.overlap(x, y) {
        Some(overlap) => overlap,
        None => return 0,
    };

    // Which glyphs does `y` still allow in the shared cell?
    let supported_glyphs: BitSet = domains
        .glyph_counts(config, y, overlap.other_cell)
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(glyph, _)| glyph)
        .collect();

    domains.retain(x, |word_id| {
        config
            .word(word_id)
            .glyphs
            .get(overlap.cell)
            .map_or(false, |&glyph| supported_glyphs.contains(glyph))
    })
}

/// Make slot `x` arc consistent with slot `y`: remove every candidate for `x` that no candidate
/// for `y` agrees with in their shared cell. Returns whether anything was removed; slots that
/// don't overlap are left alone.
pub fn revise(config: &GridConfig, domains: &mut DomainStore, x: SlotId, y: SlotId) -> bool {
    revise_impl(config, domains, x, y) > 0
}

/// Every ordered pair of distinct slots that share a cell.
#[must_use]
pub fn all_arcs(config: &GridConfig) -> Vec<SlotArc> {
    (0..config.slot_count())
        .flat_map(|x| config.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
}

/// Worklist used by `ac3`. An arc that's already waiting isn't queued a second time.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<SlotArc>,
    queued: HashSet<SlotArc>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
    where
        Items: IntoIterator<Item = SlotArc>,
    {
        let mut queue = ConsistencyQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<SlotArc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: SlotArc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a successful call to `ac3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    pub revisions: u64,
    pub eliminations: usize,
}

/// Returned by `ac3` when a slot runs out of candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub emptied_slot_id: SlotId,
    pub revisions: u64,
    pub eliminations: usize,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make every domain arc consistent, starting from the given arcs or, if `arcs` is `None`, from
/// every arc in the grid. Fails as soon as any slot's domain is emptied.
pub fn ac3(
    config: &GridConfig,
    domains: &mut DomainStore,
    arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    let mut queue =
        ConsistencyQueue::with_initial_queue(arcs.unwrap_or_else(|| all_arcs(config)));

    let mut revisions: u64 = 0;
    let mut eliminations: usize = 0;

    while let Some((x, y)) = queue.pop_front() {
        let removed = revise_impl(config, domains, x, y);
        revisions += 1;
        eliminations += removed;

        if domains.is_empty(x) {
            log::debug!(
                "AC-3 emptied the domain of {:?} after {revisions} revisions",
                config.slot(x)
            );
            return Err(ArcConsistencyFailure {
                emptied_slot_id: x,
                revisions,
                eliminations,
            });
        }

        // Shrinking `x` can leave any of its other neighbors without support.
        if removed > 0 {
            for &z in config.neighbors(x) {
                if z != y {
                    queue.enqueue((z, x));
                }
            }
        }
    }

    log::debug!("AC-3 removed {eliminations} candidates in {revisions} revisions");

    Ok(ArcConsistencySuccess {
        revisions,
        eliminations,
    })
}
