//! Per-slot candidate sets, stored as bit sets of `WordId`s.

use bit_set::BitSet;
use smallvec::SmallVec;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;
use crate::MAX_GLYPH_COUNT;

/// Number of candidates in a slot's domain that place each glyph in a given cell, indexed by
/// `GlyphId`.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// The current candidate words for every slot. Consistency enforcement only ever removes
/// candidates; the search reads domains but never changes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStore {
    domains: Vec<BitSet>,
}

impl DomainStore {
    /// Start every slot off with every word in the config's word list.
    #[must_use]
    pub fn new(config: &GridConfig) -> DomainStore {
        let word_count = config.word_list.len();

        DomainStore {
            domains: (0..config.slot_count())
                .map(|_| (0..word_count).collect())
                .collect(),
        }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.domains[slot_id].is_empty()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// Candidates for the slot, in ascending `WordId` order.
    pub fn iter(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[slot_id].iter()
    }

    /// Total number of candidates across all slots.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.domains.iter().map(BitSet::len).sum()
    }

    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].remove(word_id)
    }

    /// Keep only the candidates for which `keep` returns true, returning how many were removed.
    pub fn retain<F>(&mut self, slot_id: SlotId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let doomed: Vec<WordId> = self.domains[slot_id].iter().filter(|&w| !keep(w)).collect();
        for &word_id in &doomed {
            self.domains[slot_id].remove(word_id);
        }
        doomed.len()
    }

    /// Narrow a slot's domain to its intersection with `word_ids`.
    pub fn restrict<I>(&mut self, slot_id: SlotId, word_ids: I) -> usize
    where
        I: IntoIterator<Item = WordId>,
    {
        let allowed: BitSet = word_ids.into_iter().collect();
        self.retain(slot_id, |word_id| allowed.contains(word_id))
    }

    /// The candidate strings for a slot, mostly useful for logging and tests.
    #[must_use]
    pub fn words<'a>(&self, config: &'a GridConfig, slot_id: SlotId) -> Vec<&'a str> {
        self.iter(slot_id)
            .map(|word_id| config.word(word_id).string.as_str())
            .collect()
    }

    /// Count, for each glyph, how many candidates for the slot have that glyph at `cell_idx`.
    /// Candidates too short to reach the cell aren't counted.
    #[must_use]
    pub fn glyph_counts(
        &self,
        config: &GridConfig,
        slot_id: SlotId,
        cell_idx: usize,
    ) -> GlyphCounts {
        let mut counts: GlyphCounts = (0..config.word_list.glyphs.len()).map(|_| 0).collect();

        for word_id in self.iter(slot_id) {
            if let Some(&glyph) = config.word(word_id).glyphs.get(cell_idx) {
                counts[glyph] += 1;
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::generate_grid_config_from_template_string;
    use crate::word_list::WordList;

    fn config() -> GridConfig {
        generate_grid_config_from_template_string(WordList::new(["CAT", "COT", "DOGS"]), "___\n")
            .expect("valid grid")
    }

    #[test]
    fn test_new_domains_hold_every_word() {
        let config = config();
        let domains = DomainStore::new(&config);

        assert_eq!(domains.slot_count(), 1);
        assert_eq!(domains.words(&config, 0), vec!["CAT", "COT", "DOGS"]);
    }

    #[test]
    fn test_retain_and_restrict() {
        let config = config();
        let mut domains = DomainStore::new(&config);

        assert_eq!(domains.retain(0, |word_id| word_id != 2), 1);
        assert_eq!(domains.restrict(0, [1, 2]), 1);
        assert_eq!(domains.words(&config, 0), vec!["COT"]);
        assert_eq!(domains.total_len(), 1);
    }

    #[test]
    fn test_glyph_counts() {
        let config = config();
        let domains = DomainStore::new(&config);
        let glyph_o = config.word_list.glyphs.iter().position(|&c| c == 'O').unwrap();
        let glyph_a = config.word_list.glyphs.iter().position(|&c| c == 'A').unwrap();

        let counts = domains.glyph_counts(&config, 0, 1);
        assert_eq!(counts[glyph_o], 2);
        assert_eq!(counts[glyph_a], 1);

        // Only DOGS reaches the fourth cell.
        let counts = domains.glyph_counts(&config, 0, 3);
        assert_eq!(counts.iter().sum::<u32>(), 1);
    }
}
