//! Riot titles are launched through the Riot Client service rather than directly. The client's
//! installs file is authoritative when present; otherwise the usual install roots on every drive
//! are searched.
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, trace};

use super::ScanState;
use crate::{
    data::{
        Game, GameFlags, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner,
    },
    error::GamesParsingError,
    macros::logs::{debug_path, debug_source_unavailable, warn_no_games},
    utils::{get_native_path, some_if_file},
};

const PLATFORM: Platform = Platform::Riot;

/// Client installs file, relative to `%ProgramData%`
const INSTALLS_FILE: &str = "Riot Games/RiotClientInstalls.json";
const CLIENT_SERVICE_EXE: &str = "RiotClientServices.exe";
/// Client service locations, relative to each drive root
const CLIENT_SERVICE_DIRS: [&str; 3] = [
    "Riot Games/Riot Client",
    "Program Files/Riot Games/Riot Client",
    "Program Files (x86)/Riot Games/Riot Client",
];
/// Folders searched for titles when the installs file doesn't list them, relative to each drive
const SEARCH_FOLDERS: [&str; 4] = [
    "Riot Games",
    "Games/Riot Games",
    "Program Files/Riot Games",
    "Juegos/Riot Games",
];
const PATCHLINE: &str = "live";

#[derive(Debug)]
struct RiotTitle {
    key: &'static str,
    name: &'static str,
    /// Install folder name, also used to recognise the title in install paths
    folder: &'static str,
    exe: &'static str,
    product_id: &'static str,
}

static TITLES: [RiotTitle; 3] = [
    RiotTitle {
        key: "league_of_legends",
        name: "League of Legends",
        folder: "League of Legends",
        exe: "LeagueClient.exe",
        product_id: "league_of_legends",
    },
    RiotTitle {
        key: "valorant",
        name: "VALORANT",
        folder: "VALORANT",
        exe: "VALORANT.exe",
        product_id: "valorant",
    },
    RiotTitle {
        key: "lor",
        name: "Legends of Runeterra",
        folder: "LoR",
        exe: "LoR.exe",
        product_id: "bacon",
    },
];

impl RiotTitle {
    fn get_id(&self) -> String {
        format!("{}_{}", PLATFORM.id_prefix(), self.key)
    }

    /// Launched through the client service when it was found, directly otherwise
    fn get_game(&self, path_install: PathBuf, path_exe: PathBuf, path_client: Option<&Path>) -> Game {
        let (launch_target, flags) = match path_client {
            Some(path_client) => (
                LaunchTarget::CommandLine {
                    program: path_client.to_owned(),
                    args: vec![
                        format!("--launch-product={}", self.product_id),
                        format!("--launch-patchline={PATCHLINE}"),
                    ],
                },
                GameFlags {
                    requires_client_service: true,
                    needs_fallback: false,
                },
            ),
            None => (
                LaunchTarget::Executable(path_exe),
                GameFlags {
                    requires_client_service: true,
                    needs_fallback: true,
                },
            ),
        };

        Game::new(self.get_id(), self.name, PLATFORM, path_install, launch_target)
            .with_app_id(self.product_id)
            .with_flags(flags)
    }
}

/// Title whose install folder is the deepest component of `path`
fn get_title_for_path(path: &Path) -> Option<&'static RiotTitle> {
    path.components().rev().find_map(|component| {
        let component = component.as_os_str().to_string_lossy();
        TITLES
            .iter()
            .find(|title| component.eq_ignore_ascii_case(title.folder))
    })
}

// RIOT ---------------------------------------------------------------------------------
#[derive(Debug)]
pub struct Riot {
    path_installs: PathBuf,
}

impl Riot {
    pub fn new(path_program_data: &Path) -> Self {
        let path_installs = path_program_data.join(INSTALLS_FILE);
        debug_path!("client installs file", path_installs);

        Riot { path_installs }
    }

    fn read_installs(&self, state: &mut ScanState) -> Option<Value> {
        state.diagnostics.source_tried();

        let installs = read_to_string(&self.path_installs)
            .map_err(GamesParsingError::from)
            .and_then(|content| Ok(serde_json::from_str::<Value>(&content)?));

        match installs {
            Ok(installs) => Some(installs),
            Err(e) => {
                debug_source_unavailable!(self.path_installs.display(), e);
                state.diagnostics.source_unavailable();
                None
            }
        }
    }

    /// Client service path from the installs file, then from the default locations
    #[tracing::instrument(level = "trace", skip(ctx, installs))]
    fn get_client_service(&self, ctx: &ScanContext, installs: Option<&Value>) -> Option<PathBuf> {
        let from_installs = installs.and_then(|installs| {
            ["rc_default", "rc_live"].iter().find_map(|key| {
                installs
                    .get(key)
                    .and_then(Value::as_str)
                    .and_then(|path| some_if_file(get_native_path(path)))
            })
        });

        let path_client = from_installs.or_else(|| {
            ctx.paths_on_drives(&CLIENT_SERVICE_DIRS)
                .find_map(|dir| some_if_file(dir.join(CLIENT_SERVICE_EXE)))
        });

        debug!("{PLATFORM} - Client service: {path_client:?}");
        path_client
    }

    /// Titles listed as associated clients in the installs file
    fn scan_installs(&self, state: &mut ScanState, installs: &Value, path_client: Option<&Path>) {
        let Some(associated) = installs.get("associated_client").and_then(Value::as_object) else {
            trace!("{PLATFORM} - No associated clients listed");
            return;
        };

        for raw_path in associated.keys() {
            state.diagnostics.candidate_seen();

            let path_install = get_native_path(raw_path);
            let Some(title) = get_title_for_path(&path_install) else {
                trace!("{PLATFORM} - Unknown title at {raw_path:?}");
                state.diagnostics.reject(RejectReason::Excluded);
                continue;
            };

            let Some(path_exe) = some_if_file(path_install.join(title.exe)) else {
                trace!("{PLATFORM} - '{}' listed but not found at {path_install:?}", title.name);
                state.diagnostics.reject(RejectReason::NoExecutable);
                continue;
            };

            state.emit(title.get_game(path_install, path_exe, path_client));
        }
    }

    /// Titles in the default install folders, for anything the installs file didn't list
    fn scan_drives(
        &self,
        ctx: &ScanContext,
        state: &mut ScanState,
        path_client: Option<&Path>,
    ) -> Result<(), GamesParsingError> {
        for path_base in ctx.paths_on_drives(&SEARCH_FOLDERS) {
            ctx.check_cancelled()?;

            if !path_base.is_dir() {
                continue;
            }
            state.diagnostics.source_tried();

            for title in &TITLES {
                if state.found.contains_key(&title.get_id()) {
                    continue;
                }

                let path_install = path_base.join(title.folder);
                // VALORANT keeps its executable in the patchline folder
                let Some(path_exe) = some_if_file(path_install.join(title.exe))
                    .or_else(|| some_if_file(path_install.join(PATCHLINE).join(title.exe)))
                else {
                    continue;
                };

                state.diagnostics.candidate_seen();
                state.emit(title.get_game(path_install, path_exe, path_client));
            }
        }

        Ok(())
    }
}

impl Scanner for Riot {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, ctx: &ScanContext) -> bool {
        self.path_installs.is_file()
            || ctx.paths_on_drives(&SEARCH_FOLDERS).any(|p| p.is_dir())
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();

        let installs = self.read_installs(&mut state);
        let path_client = self.get_client_service(ctx, installs.as_ref());

        if let Some(installs) = &installs {
            self.scan_installs(&mut state, installs, path_client.as_deref());
        }
        ctx.check_cancelled()?;
        self.scan_drives(ctx, &mut state, path_client.as_deref())?;

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
    use test_case::test_case;

    use super::*;
    use crate::heuristics::executable::tests::{MB, create_sized_file};

    #[test_case("C:/Riot Games/League of Legends/", Some("league_of_legends"))]
    #[test_case("C:/Riot Games/VALORANT/live", Some("valorant"))]
    #[test_case("D:/Games/Riot Games/LoR/live", Some("lor"))]
    #[test_case("C:/Users/Taylor/Games/Other Game", None; "name fragment inside another folder")]
    #[test_case("C:/Riot Games/Riot Client", None)]
    fn test_get_title_for_path(raw_path: &str, key: Option<&str>) {
        assert_eq!(
            get_title_for_path(&get_native_path(raw_path)).map(|title| title.key),
            key
        );
    }

    #[test]
    fn test_riot_with_client_service() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let drive = dir.path().join("C");
        let path_client = drive.join("Riot Games/Riot Client/RiotClientServices.exe");
        let path_valorant = drive.join("Riot Games/VALORANT/live");
        create_sized_file(&path_client, MB)?;
        create_sized_file(&path_valorant.join("VALORANT.exe"), MB)?;

        let mut associated = serde_json::Map::new();
        associated.insert(
            path_valorant.to_string_lossy().into_owned(),
            Value::from(path_client.to_string_lossy().into_owned()),
        );

        let path_program_data = dir.path().join("ProgramData");
        create_dir_all(path_program_data.join("Riot Games"))?;
        write(
            path_program_data.join(INSTALLS_FILE),
            serde_json::json!({
                "associated_client": associated,
                "rc_default": path_client,
            })
            .to_string(),
        )?;

        let scanner = Riot::new(&path_program_data);
        let outcome = scanner.scan(&ScanContext::new(vec![drive], 4))?;

        assert_eq!(outcome.games.len(), 1);
        let valorant = &outcome.games[0];
        assert_eq!(valorant.id, "riot_valorant");
        assert_eq!(valorant.name, "VALORANT");
        assert_eq!(
            valorant.launch_target,
            LaunchTarget::CommandLine {
                program: path_client,
                args: vec![
                    "--launch-product=valorant".to_owned(),
                    "--launch-patchline=live".to_owned()
                ],
            }
        );
        assert!(valorant.flags.requires_client_service);
        assert!(!valorant.flags.needs_fallback);

        Ok(())
    }

    #[test]
    fn test_riot_without_client_service() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let drive = dir.path().join("D");
        let path_league = drive.join("Games/Riot Games/League of Legends");
        create_sized_file(&path_league.join("LeagueClient.exe"), MB)?;

        let scanner = Riot::new(&dir.path().join("ProgramData"));
        let ctx = ScanContext::new(vec![drive], 4);
        assert!(scanner.is_detected(&ctx));

        let outcome = scanner.scan(&ctx)?;
        assert_eq!(outcome.games.len(), 1);

        let league = &outcome.games[0];
        assert_eq!(league.id, "riot_league_of_legends");
        assert_eq!(league.app_id.as_deref(), Some("league_of_legends"));
        assert_eq!(
            league.launch_target,
            LaunchTarget::Executable(path_league.join("LeagueClient.exe"))
        );
        assert!(league.flags.needs_fallback);
        assert_eq!(outcome.diagnostics.sources_unavailable, 1);

        Ok(())
    }
}
