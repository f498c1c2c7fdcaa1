//! Heuristics shared by the folder based scanners: which executable in a directory tree is the
//! game, and whether a directory actually belongs to Steam.
pub mod executable;
pub mod ownership;

pub use executable::{ExclusionRules, ExecutableResolver};
pub use ownership::is_owned_by_steam;
