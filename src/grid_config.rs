//! This module implements code for configuring a crossword-filling operation, independent of the
//! specific fill algorithm: the grid's fillable cells, the slots derived from them, the overlap
//! table between slots, and the word list the slots are filled from.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::backtracking_search::Assignment;
use crate::word_list::{Word, WordId, WordList};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slots` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A maximal run of fillable cells in one direction. Two slots are the same slot iff all four
/// fields match.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    #[must_use]
    pub fn new(row: usize, column: usize, direction: Direction, length: usize) -> Slot {
        Slot {
            row,
            column,
            direction,
            length,
        }
    }

    /// The coords of the cell at the given offset into this slot.
    #[must_use]
    pub fn cell_coord(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.column + cell_idx),
            Direction::Down => (self.row + cell_idx, self.column),
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length).map(|cell_idx| self.cell_coord(cell_idx)).collect()
    }
}

/// A shared cell between two slots: character `cell` of this slot's word must equal character
/// `other_cell` of the other slot's word.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Overlap {
    pub cell: usize,
    pub other_cell: usize,
}

impl Overlap {
    /// The same overlap seen from the other slot.
    #[must_use]
    pub fn reversed(self) -> Overlap {
        Overlap {
            cell: self.other_cell,
            other_cell: self.cell,
        }
    }
}

/// Dense table of overlaps between every ordered pair of slots, plus each slot's neighbor list.
#[derive(Clone)]
pub struct OverlapTable {
    slot_count: usize,
    overlaps: Vec<Option<Overlap>>,
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
}

impl Debug for OverlapTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlapTable")
            .field("slot_count", &self.slot_count)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}

impl OverlapTable {
    fn new(slot_count: usize) -> OverlapTable {
        OverlapTable {
            slot_count,
            overlaps: vec![None; slot_count * slot_count],
            neighbors: (0..slot_count).map(|_| SmallVec::new()).collect(),
        }
    }

    /// Record an overlap for `(a, b)` and its mirror for `(b, a)`.
    fn insert(&mut self, a: SlotId, b: SlotId, overlap: Overlap) {
        self.overlaps[a * self.slot_count + b] = Some(overlap);
        self.overlaps[b * self.slot_count + a] = Some(overlap.reversed());
        self.neighbors[a].push(b);
        self.neighbors[b].push(a);
    }

    #[must_use]
    pub fn get(&self, a: SlotId, b: SlotId) -> Option<Overlap> {
        if a == b {
            return None;
        }
        self.overlaps[a * self.slot_count + b]
    }

    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }
}

/// Errors detected while building a `GridConfig` from an explicit slot list.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("slot {slot:?} has no cells")]
    EmptySlot { slot: Slot },

    #[error("slot {slot:?} extends outside the {height}x{width} grid")]
    SlotOutOfBounds {
        slot: Slot,
        height: usize,
        width: usize,
    },

    #[error("slot {slot:?} covers blocked cell ({row}, {column})")]
    BlockedCell {
        slot: Slot,
        row: usize,
        column: usize,
    },

    #[error("more than two slots cover cell ({row}, {column})")]
    CrowdedCell { row: usize, column: usize },

    #[error("slots {a:?} and {b:?} share more than one cell")]
    MultipleOverlaps { a: Slot, b: Slot },
}

/// The fillable-cell mask of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStructure {
    pub height: usize,
    pub width: usize,
    fillable: Vec<bool>,
}

impl GridStructure {
    #[must_use]
    pub fn new(height: usize, width: usize) -> GridStructure {
        GridStructure {
            height,
            width,
            fillable: vec![false; height * width],
        }
    }

    /// Parse a template with `_` or `.` representing fillable cells and anything else (usually
    /// `#`, but spaces too) representing blocks. Every line is a row, blank lines included;
    /// short rows are padded with blocks.
    #[must_use]
    pub fn from_template_string(template: &str) -> GridStructure {
        let rows: Vec<Vec<char>> = template.lines().map(|line| line.chars().collect()).collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut structure = GridStructure::new(rows.len(), width);

        for (row, line) in rows.iter().enumerate() {
            for (column, &cell) in line.iter().enumerate() {
                if cell == '_' || cell == '.' {
                    structure.set_fillable(row, column, true);
                }
            }
        }

        structure
    }

    pub fn set_fillable(&mut self, row: usize, column: usize, fillable: bool) {
        self.fillable[row * self.width + column] = fillable;
    }

    /// Out-of-bounds cells count as blocks.
    #[must_use]
    pub fn is_fillable(&self, row: usize, column: usize) -> bool {
        row < self.height && column < self.width && self.fillable[row * self.width + column]
    }

    /// Every maximal run of fillable cells of length at least 2, across and down, sorted.
    #[must_use]
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = vec![];

        for row in 0..self.height {
            for column in 0..self.width {
                if !self.is_fillable(row, column) {
                    continue;
                }

                if column == 0 || !self.is_fillable(row, column - 1) {
                    let length = (column..self.width)
                        .take_while(|&c| self.is_fillable(row, c))
                        .count();
                    if length > 1 {
                        slots.push(Slot::new(row, column, Direction::Across, length));
                    }
                }

                if row == 0 || !self.is_fillable(row - 1, column) {
                    let length = (row..self.height)
                        .take_while(|&r| self.is_fillable(r, column))
                        .count();
                    if length > 1 {
                        slots.push(Slot::new(row, column, Direction::Down, length));
                    }
                }
            }
        }

        slots.sort();
        slots
    }
}

/// A struct representing the aspects of a grid that are static during filling.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub structure: GridStructure,
    pub slots: Vec<Slot>,
    pub overlaps: OverlapTable,
    pub word_list: WordList,
    slot_id_by_slot: HashMap<Slot, SlotId>,
}

impl GridConfig {
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slots[slot_id]
    }

    #[must_use]
    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slot_id_by_slot.get(slot).copied()
    }

    #[must_use]
    pub fn word(&self, word_id: WordId) -> &Word {
        self.word_list.get(word_id)
    }

    #[must_use]
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<Overlap> {
        self.overlaps.get(a, b)
    }

    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        self.overlaps.neighbors(slot_id)
    }
}

/// Generate a `GridConfig` for the given structure and slots. Slots are sorted and deduplicated,
/// and must lie on fillable cells.
pub fn generate_grid_config(
    structure: GridStructure,
    mut slots: Vec<Slot>,
    word_list: WordList,
) -> Result<GridConfig, GridError> {
    slots.sort();
    slots.dedup();

    // Build a map from cell location to the slots involved, which we can then use to calculate
    // overlaps.
    let mut cells_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();

    for (slot_id, slot) in slots.iter().enumerate() {
        if slot.length == 0 {
            return Err(GridError::EmptySlot { slot: *slot });
        }

        for (cell_idx, (row, column)) in slot.cell_coords().into_iter().enumerate() {
            if row >= structure.height || column >= structure.width {
                return Err(GridError::SlotOutOfBounds {
                    slot: *slot,
                    height: structure.height,
                    width: structure.width,
                });
            }
            if !structure.is_fillable(row, column) {
                return Err(GridError::BlockedCell {
                    slot: *slot,
                    row,
                    column,
                });
            }

            let cell = cells_by_loc.entry((row, column)).or_default();
            if cell.len() == 2 {
                return Err(GridError::CrowdedCell { row, column });
            }
            cell.push((slot_id, cell_idx));
        }
    }

    let mut overlaps = OverlapTable::new(slots.len());
    let mut locs: Vec<_> = cells_by_loc.into_iter().collect();
    locs.sort_by_key(|&(loc, _)| loc);

    for (_, cell) in locs {
        if let &[(a, a_cell), (b, b_cell)] = cell.as_slice() {
            if overlaps.get(a, b).is_some() {
                return Err(GridError::MultipleOverlaps {
                    a: slots[a],
                    b: slots[b],
                });
            }
            overlaps.insert(
                a,
                b,
                Overlap {
                    cell: a_cell,
                    other_cell: b_cell,
                },
            );
        }
    }
    for neighbors in &mut overlaps.neighbors {
        neighbors.sort_unstable();
    }

    let slot_id_by_slot = slots
        .iter()
        .enumerate()
        .map(|(slot_id, &slot)| (slot, slot_id))
        .collect();

    log::debug!(
        "Configured {}x{} grid with {} slots and {} words",
        structure.height,
        structure.width,
        slots.len(),
        word_list.len()
    );

    Ok(GridConfig {
        structure,
        slots,
        overlaps,
        word_list,
        slot_id_by_slot,
    })
}

/// Generate a grid config from a string template, with `_` or `.` representing empty cells and
/// `#` representing blocks.
pub fn generate_grid_config_from_template_string(
    word_list: WordList,
    template: &str,
) -> Result<GridConfig, GridError> {
    let structure = GridStructure::from_template_string(template);
    let slots = structure.slots();

    generate_grid_config(structure, slots, word_list)
}

/// Generate a grid config for a `height` x `width` grid whose fillable cells are exactly the
/// cells covered by `slots`.
pub fn generate_grid_config_from_slots(
    word_list: WordList,
    height: usize,
    width: usize,
    slots: Vec<Slot>,
) -> Result<GridConfig, GridError> {
    let mut structure = GridStructure::new(height, width);

    for slot in &slots {
        for (row, column) in slot.cell_coords() {
            if row >= height || column >= width {
                return Err(GridError::SlotOutOfBounds {
                    slot: *slot,
                    height,
                    width,
                });
            }
            structure.set_fillable(row, column, true);
        }
    }

    generate_grid_config(structure, slots, word_list)
}

/// Return a `height` x `width` grid of the letters placed by `assignment`. Cells not covered by
/// an assigned slot are `None`.
#[must_use]
pub fn letter_grid(config: &GridConfig, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.structure.width]; config.structure.height];

    for (slot_id, word_id) in assignment.iter() {
        let slot = config.slot(slot_id);
        let word = config.word(word_id);

        for (cell_idx, &glyph) in word.glyphs.iter().enumerate().take(slot.length) {
            let (row, column) = slot.cell_coord(cell_idx);
            letters[row][column] = Some(config.word_list.glyphs[glyph]);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, with `█` for blocks and a
/// space for fillable cells that haven't been filled.
#[must_use]
pub fn render_grid(config: &GridConfig, assignment: &Assignment) -> String {
    let letters = letter_grid(config, assignment);

    letters
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(column, letter)| {
                    if config.structure.is_fillable(row, column) {
                        letter.unwrap_or(' ')
                    } else {
                        '█'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_list::WordList;
    use Direction::{Across, Down};

    /// ##_#
    /// ____
    /// ##_#
    fn plus_config() -> GridConfig {
        generate_grid_config_from_template_string(
            WordList::new(["CAT", "DOGS"]),
            "##_#\n____\n##_#",
        )
        .expect("valid grid")
    }

    #[test]
    fn test_template_slots() {
        let config = plus_config();

        assert_eq!(
            config.slots,
            vec![Slot::new(0, 2, Down, 3), Slot::new(1, 0, Across, 4)]
        );
        assert_eq!(config.structure.height, 3);
        assert_eq!(config.structure.width, 4);
    }

    #[test]
    fn test_overlaps_are_symmetric() {
        let config = plus_config();

        assert_eq!(
            config.overlap(0, 1),
            Some(Overlap {
                cell: 1,
                other_cell: 2
            })
        );
        assert_eq!(
            config.overlap(1, 0),
            Some(Overlap {
                cell: 2,
                other_cell: 1
            })
        );
        assert_eq!(config.overlap(0, 0), None);
        assert_eq!(config.neighbors(0), &[1]);
        assert_eq!(config.neighbors(1), &[0]);
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let structure = GridStructure::from_template_string("_#_\n#_#\n");

        assert!(structure.slots().is_empty());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let structure = GridStructure::from_template_string("___\n_\n_\n");

        assert_eq!(structure.width, 3);
        assert!(!structure.is_fillable(1, 2));
        assert_eq!(
            structure.slots(),
            vec![Slot::new(0, 0, Across, 3), Slot::new(0, 0, Down, 3)]
        );
    }

    #[test]
    fn test_spaces_and_blank_lines_are_blocks() {
        let structure = GridStructure::from_template_string(" __\n\n___\r\n");

        assert_eq!(structure.height, 3);
        assert_eq!(structure.width, 3);
        assert!(!structure.is_fillable(0, 0));
        assert!(!structure.is_fillable(1, 1));
        assert_eq!(
            structure.slots(),
            vec![Slot::new(0, 1, Across, 2), Slot::new(2, 0, Across, 3)]
        );
    }

    #[test]
    fn test_slot_lookup_is_structural() {
        let config = plus_config();

        assert_eq!(config.slot_id(&Slot::new(1, 0, Across, 4)), Some(1));
        assert_eq!(config.slot_id(&Slot::new(1, 0, Across, 3)), None);
    }

    #[test]
    fn test_explicit_slots() {
        let config = generate_grid_config_from_slots(
            WordList::new(["CAT"]),
            3,
            3,
            vec![Slot::new(0, 1, Down, 3), Slot::new(0, 0, Across, 3)],
        )
        .expect("valid grid");

        assert_eq!(config.slot(0), &Slot::new(0, 0, Across, 3));
        assert_eq!(
            config.overlap(0, 1),
            Some(Overlap {
                cell: 1,
                other_cell: 0
            })
        );
        assert!(!config.structure.is_fillable(1, 0));
    }

    #[test]
    fn test_explicit_slots_out_of_bounds() {
        let result = generate_grid_config_from_slots(
            WordList::new(["CAT"]),
            1,
            2,
            vec![Slot::new(0, 0, Across, 3)],
        );

        assert!(matches!(result, Err(GridError::SlotOutOfBounds { .. })));
    }

    #[test]
    fn test_parallel_slots_sharing_two_cells() {
        let result = generate_grid_config_from_slots(
            WordList::new(["CAT"]),
            1,
            4,
            vec![Slot::new(0, 0, Across, 3), Slot::new(0, 1, Across, 3)],
        );

        assert!(matches!(result, Err(GridError::MultipleOverlaps { .. })));
    }

    #[test]
    fn test_crowded_cell() {
        let result = generate_grid_config_from_slots(
            WordList::new(["CAT"]),
            3,
            3,
            vec![
                Slot::new(0, 0, Across, 3),
                Slot::new(0, 0, Down, 3),
                Slot::new(0, 0, Across, 2),
            ],
        );

        assert!(matches!(result, Err(GridError::CrowdedCell { row: 0, column: 0 })));
    }

    #[test]
    fn test_blocked_cell() {
        let mut structure = GridStructure::new(1, 3);
        structure.set_fillable(0, 0, true);
        structure.set_fillable(0, 1, true);

        let result = generate_grid_config(
            structure,
            vec![Slot::new(0, 0, Across, 3)],
            WordList::new(["CAT"]),
        );

        assert_eq!(
            result.unwrap_err(),
            GridError::BlockedCell {
                slot: Slot::new(0, 0, Across, 3),
                row: 0,
                column: 2
            }
        );
    }

    #[test]
    fn test_render_grid() {
        let config = plus_config();
        let mut assignment = Assignment::new();
        assignment.insert(1, config.word_list.word_id("DOGS").unwrap());

        assert_eq!(render_grid(&config, &assignment), "██ █\nDOGS\n██ █");

        let letters = letter_grid(&config, &assignment);
        assert_eq!(letters[1][2], Some('G'));
        assert_eq!(letters[0][2], None);
    }
}
