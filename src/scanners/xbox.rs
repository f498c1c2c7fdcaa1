use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    heuristics::{ExecutableResolver, is_owned_by_steam},
    macros::logs::{trace_rejected, warn_no_games},
    utils::{get_file_name, get_sorted_files, get_sorted_sub_dirs, some_if_file, split_camel_case},
};

const PLATFORM: Platform = Platform::Xbox;

/// Library folder names used by the Xbox app, checked at each drive root and below the
/// program folders. On case insensitive filesystems the same folder is listed twice, the
/// found-set drops the repeats.
const LIBRARY_FOLDERS: [&str; 8] = [
    "XboxGames",
    "Xbox Games",
    "Juegos",
    "juegos",
    "Games",
    "games",
    "Game Pass",
    "GamePass",
];
const LIBRARY_PARENTS: [&str; 3] = ["", "Program Files", "Programas"];

const CONTENT_DIR: &str = "Content";
const MANIFEST_FILES: [&str; 2] = ["appxmanifest.xml", "MicrosoftGame.Config"];
/// Extensions of the package metadata files found in `Content`
const PACKAGE_EXTENSIONS: [&str; 4] = ["xvs", "xvi", "xct", "smd"];
const COVER_FILES: [&str; 6] = [
    "GraphicsLogo.png",
    "SmallLogo.png",
    "Logo.png",
    "icon.png",
    "cover.png",
    "poster.png",
];

/// Whether the folder has the layout of an installed Xbox package
fn is_xbox_game_dir(path_game: &Path) -> bool {
    let path_content = path_game.join(CONTENT_DIR);
    if !path_content.is_dir() {
        return false;
    }

    let has_manifest = MANIFEST_FILES.iter().any(|file| {
        path_content.join(file).is_file() || path_game.join(file).is_file()
    });

    has_manifest
        || get_sorted_files(&path_content).is_ok_and(|files| {
            files.iter().any(|file| {
                file.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PACKAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
        })
}

/// Logo shipped inside the package, used as local box art
fn get_box_art(path_content: &Path) -> Option<PathBuf> {
    COVER_FILES
        .iter()
        .find_map(|file| some_if_file(path_content.join(file)))
        .or_else(|| {
            get_sorted_files(path_content).ok()?.into_iter().find(|file| {
                get_file_name(file).is_some_and(|name| {
                    let name = name.to_lowercase();
                    name.ends_with(".png") && name.contains("logo")
                })
            })
        })
}

/// ID for a package folder name: lowercase, anything but ASCII letters and digits becomes `_`
fn get_xbox_id(folder_name: &str) -> String {
    let slug: String = folder_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    format!("{}_{slug}", PLATFORM.id_prefix())
}

// XBOX ---------------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct Xbox;

impl Xbox {
    pub fn new() -> Self {
        Xbox
    }

    fn get_search_folders() -> Vec<String> {
        LIBRARY_PARENTS
            .iter()
            .flat_map(|parent| {
                LIBRARY_FOLDERS.iter().map(move |folder| match *parent {
                    "" => folder.to_string(),
                    parent => format!("{parent}/{folder}"),
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "trace", skip(ctx, state))]
    fn get_game(&self, ctx: &ScanContext, state: &mut ScanState, path_game: PathBuf) {
        let Some(folder_name) = get_file_name(&path_game) else {
            return;
        };
        state.diagnostics.candidate_seen();

        let id = get_xbox_id(&folder_name);
        if state.found.contains(&id, &path_game) {
            state.diagnostics.reject(RejectReason::Duplicate);
            return;
        }

        if is_owned_by_steam(&path_game) {
            trace_rejected!(RejectReason::OwnedBySteam, folder_name, path_game);
            state.diagnostics.reject(RejectReason::OwnedBySteam);
            return;
        }

        let path_content = path_game.join(CONTENT_DIR);
        let Some(path_exe) = ExecutableResolver::new(ctx.max_depth).resolve(&path_content)
        else {
            trace_rejected!(RejectReason::NoExecutable, folder_name, path_content);
            state.diagnostics.reject(RejectReason::NoExecutable);
            return;
        };

        let name = split_camel_case(&folder_name);
        debug!("{PLATFORM} - Found '{name}' at {path_exe:?}");

        state.emit(
            Game::new(
                id,
                name,
                PLATFORM,
                path_game,
                LaunchTarget::Executable(path_exe),
            )
            .with_box_art(get_box_art(&path_content)),
        );
    }
}

impl Scanner for Xbox {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, ctx: &ScanContext) -> bool {
        let folders = Self::get_search_folders();
        let folders: Vec<&str> = folders.iter().map(String::as_str).collect();
        ctx.paths_on_drives(&folders).any(|p| p.is_dir())
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();

        let folders = Self::get_search_folders();
        let folders: Vec<&str> = folders.iter().map(String::as_str).collect();

        for path_library in ctx.paths_on_drives(&folders) {
            ctx.check_cancelled()?;

            if !path_library.is_dir() {
                continue;
            }
            state.diagnostics.source_tried();

            let dirs = match get_sorted_sub_dirs(&path_library) {
                Ok(dirs) => dirs,
                Err(e) => {
                    trace!("{PLATFORM} - Could not list {path_library:?}: {e}");
                    state.diagnostics.source_unavailable();
                    continue;
                }
            };

            for path_game in dirs.into_iter().filter(|dir| is_xbox_game_dir(dir)) {
                self.get_game(ctx, &mut state, path_game);
            }
        }

        if state.games.is_empty() {
            warn_no_games!();
        }

        Ok(state.into_outcome())
    }
}
