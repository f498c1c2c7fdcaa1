use tracing::debug;

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    heuristics::is_owned_by_steam,
    macros::logs::{trace_rejected, warn_no_games},
    utils::{get_id_slug, some_if_file},
};

const PLATFORM: Platform = Platform::Rockstar;

/// Folders searched for known titles, relative to each drive root
const SEARCH_FOLDERS: [&str; 9] = [
    "Juegos",
    "Games",
    "Rockstar Games",
    "Program Files/Rockstar Games",
    "Program Files (x86)/Rockstar Games",
    "Epic Games",
    "Program Files/Epic Games",
    "Programas",
    "Programas/Rockstar Games",
];

#[derive(Debug)]
struct RockstarTitle {
    name: &'static str,
    folders: &'static [&'static str],
    /// Checked in order, the first one present wins
    exes: &'static [&'static str],
}

const TITLES: [RockstarTitle; 5] = [
    RockstarTitle {
        name: "Grand Theft Auto V",
        folders: &[
            "Grand Theft Auto V",
            "Grand Theft Auto V Enhanced",
            "GTAV",
            "GTA5",
            "GTA V",
            "GTA V Enhanced",
        ],
        exes: &[
            "GTA5_Enhanced.exe",
            "GTA5_Enhanced_BE.exe",
            "PlayGTAV.exe",
            "GTA5.exe",
            "GTAV.exe",
            "GTAVLauncher.exe",
        ],
    },
    RockstarTitle {
        name: "Red Dead Redemption 2",
        folders: &["Red Dead Redemption 2", "RDR2", "Red Dead 2"],
        exes: &["RDR2.exe", "PlayRDR2.exe", "RedDeadRedemption2.exe"],
    },
    RockstarTitle {
        name: "Grand Theft Auto IV",
        folders: &["Grand Theft Auto IV", "GTAIV", "GTA4", "GTA IV"],
        exes: &["GTAIV.exe", "LaunchGTAIV.exe", "GTA4.exe"],
    },
    RockstarTitle {
        name: "Max Payne 3",
        folders: &["Max Payne 3", "MaxPayne3"],
        exes: &["MaxPayne3.exe", "Max Payne 3.exe"],
    },
    RockstarTitle {
        name: "L.A. Noire",
        folders: &["L.A. Noire", "LA Noire", "LANoire"],
        exes: &["LANoire.exe", "L.A. Noire.exe"],
    },
];

impl RockstarTitle {
    fn get_id(&self) -> String {
        format!("{}_{}", PLATFORM.id_prefix(), get_id_slug(self.name))
    }
}

// ROCKSTAR -----------------------------------------------------------------------------
/// Known Rockstar titles, matched by folder and executable name on every drive
#[derive(Debug, Default)]
pub struct Rockstar;

impl Rockstar {
    pub fn new() -> Self {
        Rockstar
    }
}

impl Scanner for Rockstar {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, ctx: &ScanContext) -> bool {
        ctx.paths_on_drives(&SEARCH_FOLDERS).any(|p| p.is_dir())
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();

        for path_base in ctx.paths_on_drives(&SEARCH_FOLDERS) {
            ctx.check_cancelled()?;

            if !path_base.is_dir() {
                continue;
            }
            state.diagnostics.source_tried();

            for title in &TITLES {
                let id = title.get_id();
                if state.found.contains_key(&id) {
                    continue;
                }

                for path_game in title.folders.iter().map(|f| path_base.join(f)) {
                    if !path_game.is_dir() {
                        continue;
                    }
                    state.diagnostics.candidate_seen();

                    if is_owned_by_steam(&path_game) {
                        trace_rejected!(RejectReason::OwnedBySteam, title.name, path_game);
                        state.diagnostics.reject(RejectReason::OwnedBySteam);
                        continue;
                    }

                    let Some(path_exe) = title
                        .exes
                        .iter()
                        .find_map(|exe| some_if_file(path_game.join(exe)))
                    else {
                        trace_rejected!(RejectReason::NoExecutable, title.name, path_game);
                        state.diagnostics.reject(RejectReason::NoExecutable);
                        continue;
                    };

                    debug!("{PLATFORM} - Found '{}' at {path_exe:?}", title.name);
                    state.emit(Game::new(
                        id.as_str(),
                        title.name,
                        PLATFORM,
                        path_game,
                        LaunchTarget::Executable(path_exe),
                    ));
                    break;
                }
            }
        }

        if state.games.is_empty() {
            warn_no_games!();
        }

        Ok(state.into_outcome())
    }
}
