//! Debounced typeahead search over canonical tags

pub mod debounce;
pub mod session;
pub mod state;

pub use debounce::Debouncer;
pub use session::{SearchOptions, SearchSession};
pub use state::{FailureKind, ResultEntry, SearchState, StatusTone};
