//! URL-backed filter state store

pub mod labels;
pub mod state;

pub use labels::{ActiveFilter, Lookups, UNKNOWN_LABEL};
pub use state::{AddOutcome, FilterError, FilterKind, FilterLimits, FilterState, Toggle};
