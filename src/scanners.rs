//! One scanner per platform. Scanners are independent of each other: each owns its found-set and
//! result list for the duration of a single [`crate::data::Scanner::scan`] call.
mod custom;
mod ea;
mod epic;
mod heuristic;
mod riot;
mod rockstar;
mod steam;
mod ubisoft;
mod xbox;

use std::{collections::HashSet, path::Path};

pub use custom::CustomGames;
pub use epic::Epic;
pub use heuristic::{HeuristicProfile, HeuristicScanner};
pub use riot::Riot;
pub use rockstar::Rockstar;
pub use steam::Steam;
pub use xbox::Xbox;

use crate::{
    data::{Game, RejectReason, ScanDiagnostics, ScanOutcome},
    utils::get_path_key,
};

/// Titles already emitted during one scan, by ID and by install directory
#[derive(Debug, Default)]
pub(crate) struct FoundSet {
    keys: HashSet<String>,
    dirs: HashSet<String>,
}

impl FoundSet {
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(&key.to_lowercase())
    }

    /// Empty directories (e.g. protocol-only custom games) only match by key
    pub fn contains(&self, key: &str, dir: &Path) -> bool {
        let dir_key = get_path_key(dir);
        self.contains_key(key) || (!dir_key.is_empty() && self.dirs.contains(&dir_key))
    }

    pub fn insert(&mut self, key: &str, dir: &Path) {
        self.keys.insert(key.to_lowercase());

        let dir_key = get_path_key(dir);
        if !dir_key.is_empty() {
            self.dirs.insert(dir_key);
        }
    }
}

/// State of a single scanner run, owned by that run's call frame
#[derive(Debug, Default)]
pub(crate) struct ScanState {
    pub found: FoundSet,
    pub games: Vec<Game>,
    pub diagnostics: ScanDiagnostics,
}

impl ScanState {
    /// Records the game unless its ID or install directory was already emitted
    pub fn emit(&mut self, game: Game) -> bool {
        if self.found.contains(&game.id, &game.install_dir) {
            self.diagnostics.reject(RejectReason::Duplicate);
            return false;
        }

        self.found.insert(&game.id, &game.install_dir);
        self.games.push(game);
        true
    }

    pub fn into_outcome(self) -> ScanOutcome {
        ScanOutcome {
            games: self.games,
            diagnostics: self.diagnostics,
        }
    }
}
