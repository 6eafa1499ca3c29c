pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod log;
pub mod word_list;

pub use backtracking_search::{find_fill, solve, Assignment, FillFailure, FillSuccess, SolverConfig};
pub use domains::DomainStore;
pub use grid_config::{
    generate_grid_config_from_slots, generate_grid_config_from_template_string, letter_grid,
    render_grid, Direction, GridConfig, Slot, SlotId,
};
pub use word_list::{WordId, WordList};

/// Extra assertions during search. Always on for this crate's own unit tests.
pub const CHECK_INVARIANTS: bool = cfg!(any(test, feature = "check_invariants"));

/// The expected maximum number of distinct characters/rebuses/whatever appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
