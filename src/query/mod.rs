pub mod excerpt;
pub mod executor;
pub mod fuzzy;

pub use excerpt::{MatchCursor, extract_excerpts, find_matching_lines};
pub use executor::{MAX_HITS, SearchResult, search, search_index};
pub use fuzzy::{Suggestion, edit_distance, suggest};
