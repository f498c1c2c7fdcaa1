use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::trace;

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    macros::logs::{debug_path, debug_source_unavailable},
    utils::{get_id_slug, get_native_path},
};

const PLATFORM: Platform = Platform::Custom;

/// Works out how a user supplied launch string should be run: protocol URIs are opened, a quoted
/// program followed by arguments is run as a command line, anything else is a plain path
pub fn parse_custom_launch_target(raw: &str) -> LaunchTarget {
    let raw = raw.trim();

    if raw.contains("://") {
        return LaunchTarget::Protocol(raw.to_owned());
    }

    if let Some(rest) = raw.strip_prefix('"') {
        if let Some((program, args)) = rest.split_once('"') {
            return LaunchTarget::CommandLine {
                program: get_native_path(program),
                args: args.split_whitespace().map(ToOwned::to_owned).collect(),
            };
        }
    }

    LaunchTarget::Executable(get_native_path(raw))
}

/// Reads one stored entry, `None` if the required fields are missing
fn parse_custom_game(entry: &Value) -> Option<Game> {
    let get_string = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let name = get_string("name")?;
    let raw_launch = get_string("exePath")?;
    let launch_target = parse_custom_launch_target(raw_launch);

    let id = get_string("id")
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("{}_{}", PLATFORM.id_prefix(), get_id_slug(name)));

    let install_dir = get_string("installDir")
        .map(get_native_path)
        .or_else(|| match &launch_target {
            LaunchTarget::Executable(path) | LaunchTarget::CommandLine { program: path, .. } => {
                path.parent().map(Path::to_path_buf)
            }
            LaunchTarget::Protocol(_) => None,
        })
        .unwrap_or_default();

    let mut game = Game::new(id, name, PLATFORM, install_dir, launch_target);
    game.cover_url = get_string("coverUrl").map(ToOwned::to_owned);

    Some(game)
}

// CUSTOM GAMES -------------------------------------------------------------------------
/// Games added by hand, stored as a JSON list by the library management side
#[derive(Debug)]
pub struct CustomGames {
    path_custom_games: PathBuf,
}

impl CustomGames {
    pub fn new(path_custom_games: PathBuf) -> Self {
        debug_path!("custom games file", path_custom_games);
        CustomGames { path_custom_games }
    }
}

impl Scanner for CustomGames {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, _ctx: &ScanContext) -> bool {
        self.path_custom_games.is_file()
    }

    /// A missing file means no custom games; an unparsable one is an error, so that the failure
    /// shows up in the scan report instead of silently hiding every entry
    #[tracing::instrument(level = "trace", skip(_ctx))]
    fn scan(&self, _ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();
        state.diagnostics.source_tried();

        let content = match read_to_string(&self.path_custom_games) {
            Ok(content) => content,
            Err(e) => {
                debug_source_unavailable!(self.path_custom_games.display(), e);
                state.diagnostics.source_unavailable();
                return Ok(state.into_outcome());
            }
        };

        let entries: Value = serde_json::from_str(&content)?;
        let Some(entries) = entries.as_array() else {
            return Err(GamesParsingError::Other(format!(
                "expected a list of games in {:?}",
                self.path_custom_games
            )));
        };

        for entry in entries {
            state.diagnostics.candidate_seen();

            match parse_custom_game(entry) {
                Some(game) => {
                    state.emit(game);
                }
                None => {
                    trace!("{PLATFORM} - Skipped malformed entry: {entry}");
                    state.diagnostics.reject(RejectReason::MalformedEntry);
                }
            }
        }

        Ok(state.into_outcome())
    }
}
