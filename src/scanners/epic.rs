use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, trace};

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    macros::logs::{debug_path, debug_source_unavailable, trace_rejected, warn_no_games},
    utils::{clean_game_title, get_id_slug, get_native_path, get_sorted_files},
};

const PLATFORM: Platform = Platform::Epic;

/// Location of the launcher's install manifests, relative to `%ProgramData%`
const MANIFESTS_DIR: &str = "Epic/EpicGamesLauncher/Data/Manifests";

/// Fields of an `.item` install manifest this crate cares about
#[derive(Debug)]
struct ParsableManifestData {
    title: String,
    app_name: Option<String>,
    path_install: PathBuf,
    launch_executable: String,
}

/// Reads the fields out of a manifest, `None` if any required one is missing or empty
fn parse_manifest(manifest: &Value) -> Option<ParsableManifestData> {
    let get_string = |key: &str| {
        manifest
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    };

    Some(ParsableManifestData {
        title: get_string("DisplayName")?,
        app_name: get_string("AppName").or_else(|| get_string("CatalogItemId")),
        path_install: get_native_path(&get_string("InstallLocation")?),
        launch_executable: get_string("LaunchExecutable")?,
    })
}

// EPIC ---------------------------------------------------------------------------------
#[derive(Debug)]
pub struct Epic {
    path_manifests: PathBuf,
}

impl Epic {
    pub fn new(path_program_data: &Path) -> Self {
        let path_manifests = path_program_data.join(MANIFESTS_DIR);
        debug_path!("manifests directory", path_manifests);

        Epic { path_manifests }
    }

    #[tracing::instrument(level = "trace", skip(state))]
    fn get_game(&self, state: &mut ScanState, path_manifest: &Path) -> Result<(), GamesParsingError> {
        state.diagnostics.candidate_seen();

        let manifest: Value = serde_json::from_str(&read_to_string(path_manifest)?)?;
        let Some(ParsableManifestData {
            title,
            app_name,
            path_install,
            launch_executable,
        }) = parse_manifest(&manifest)
        else {
            trace_rejected!(RejectReason::MalformedEntry, "?", path_manifest);
            state.diagnostics.reject(RejectReason::MalformedEntry);
            return Ok(());
        };

        let title = clean_game_title(title);

        if !path_install.is_dir() {
            trace_rejected!(RejectReason::MissingInstallDir, title, path_install);
            state.diagnostics.reject(RejectReason::MissingInstallDir);
            return Ok(());
        }

        let path_exe = path_install.join(get_native_path(&launch_executable));
        if !path_exe.is_file() {
            trace_rejected!(RejectReason::NoExecutable, title, path_exe);
            state.diagnostics.reject(RejectReason::NoExecutable);
            return Ok(());
        }

        let id_suffix = app_name.clone().unwrap_or_else(|| get_id_slug(&title));
        let mut game = Game::new(
            format!("{}_{id_suffix}", PLATFORM.id_prefix()),
            title,
            PLATFORM,
            path_install,
            LaunchTarget::Executable(path_exe),
        );
        if let Some(app_name) = app_name {
            game = game.with_app_id(app_name);
        }

        trace!("{PLATFORM} - Game parsed from {path_manifest:?}: {game:?}");
        state.emit(game);

        Ok(())
    }
}

impl Scanner for Epic {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, _ctx: &ScanContext) -> bool {
        self.path_manifests.is_dir()
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();
        state.diagnostics.source_tried();

        let manifests = match get_sorted_files(&self.path_manifests) {
            Ok(files) => files,
            Err(e) => {
                debug_source_unavailable!(self.path_manifests.display(), e);
                state.diagnostics.source_unavailable();
                return Ok(state.into_outcome());
            }
        };

        for path_manifest in manifests
            .iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "item"))
        {
            ctx.check_cancelled()?;

            if let Err(e) = self.get_game(&mut state, path_manifest) {
                debug!("{PLATFORM} - Malformed manifest {path_manifest:?}: {e}");
                state.diagnostics.reject(RejectReason::MalformedEntry);
            }
        }

        if state.games.is_empty() {
            warn_no_games!();
        }

        Ok(state.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::heuristics::executable::tests::{MB, create_sized_file};

    fn write_manifest(
        path_manifests: &Path,
        file_name: &str,
        manifest: &Value,
    ) -> Result<(), GamesParsingError> {
        create_dir_all(path_manifests)?;
        write(path_manifests.join(file_name), serde_json::to_string(manifest)?)?;
        Ok(())
    }

    #[test]
    fn test_epic_scanner() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let path_manifests = dir.path().join(MANIFESTS_DIR);
        let path_fortnite = dir.path().join("Epic Games/Fortnite");
        let path_gtav = dir.path().join("Epic Games/GTAV");
        create_sized_file(
            &path_fortnite.join("FortniteGame/Binaries/Win64/FortniteLauncher.exe"),
            MB,
        )?;
        create_sized_file(&path_gtav.join("GTA5.exe"), MB)?;

        write_manifest(
            &path_manifests,
            "A1.item",
            &serde_json::json!({
                "DisplayName": "Fortnite",
                "AppName": "Fortnite",
                "InstallLocation": path_fortnite,
                "LaunchExecutable": "FortniteGame/Binaries/Win64/FortniteLauncher.exe",
            }),
        )?;
        write_manifest(
            &path_manifests,
            "B2.item",
            &serde_json::json!({
                "DisplayName": "Grand Theft Auto V",
                "CatalogItemId": "0584d2013f0149a791e7b9bad0eec102",
                "InstallLocation": path_gtav,
                "LaunchExecutable": "GTA5.exe",
            }),
        )?;
        // Executable missing
        write_manifest(
            &path_manifests,
            "C3.item",
            &serde_json::json!({
                "DisplayName": "Alan Wake 2",
                "AppName": "Dodo",
                "InstallLocation": path_gtav,
                "LaunchExecutable": "AlanWake2.exe",
            }),
        )?;
        write(path_manifests.join("D4.item"), "{ not json")?;
        write(path_manifests.join("notes.txt"), "ignored")?;

        let scanner = Epic::new(dir.path());
        let ctx = ScanContext::new(Vec::new(), 4);
        assert!(scanner.is_detected(&ctx));

        let outcome = scanner.scan(&ctx)?;
        let ids: Vec<_> = outcome.games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            ids,
            ["epic_Fortnite", "epic_0584d2013f0149a791e7b9bad0eec102"]
        );
        assert_eq!(
            outcome.games[1].launch_target,
            LaunchTarget::Executable(path_gtav.join("GTA5.exe"))
        );

        let diagnostics = &outcome.diagnostics;
        assert_eq!(diagnostics.candidates_seen, 4);
        assert_eq!(diagnostics.rejected_for(RejectReason::NoExecutable), 1);
        assert_eq!(diagnostics.rejected_for(RejectReason::MalformedEntry), 1);

        Ok(())
    }

    #[test]
    fn test_epic_not_installed() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let scanner = Epic::new(dir.path());
        let ctx = ScanContext::new(Vec::new(), 4);

        assert!(!scanner.is_detected(&ctx));
        let outcome = scanner.scan(&ctx)?;
        assert!(outcome.games.is_empty());
        assert_eq!(outcome.diagnostics.sources_unavailable, 1);

        Ok(())
    }
}
