pub mod random;

pub use random::{PlacementError, random_placer};

/// Attempts per component before the placer gives up.
pub const DEFAULT_MAX_TRIES: usize = 100_000;
