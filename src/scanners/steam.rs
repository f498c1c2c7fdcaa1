use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    sync::Arc,
};

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till},
    sequence::delimited,
};
use tracing::{debug, error, trace};
use walkdir::WalkDir;

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    macros::logs::{debug_path, debug_source_unavailable, trace_rejected, warn_no_games},
    parsers::{find_all_values_vdf, find_value_vdf},
    system::registry::{RegistryReader, parse_registry_dump},
    utils::{
        clean_game_title, get_file_name, get_native_path, get_path_key, get_sorted_files,
        some_if_dir, some_if_file,
    },
};

const PLATFORM: Platform = Platform::Steam;

/// Registry values holding the Steam install directory, most specific first
const STEAM_REGISTRY_VALUES: [(&str, &str); 3] = [
    (
        "HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Valve\\Steam",
        "InstallPath",
    ),
    ("HKEY_LOCAL_MACHINE\\SOFTWARE\\Valve\\Steam", "InstallPath"),
    ("HKEY_CURRENT_USER\\Software\\Valve\\Steam", "SteamPath"),
];

/// Tools and runtimes Steam lists like any other app
const EXCLUDED_APP_IDS: [&str; 2] = ["228980", "1007"];
const EXCLUDED_TITLES: [&str; 2] = ["Steamworks Common Redistributables", "Steamworks Shared"];

const BOX_ART_FILE_NAME: &str = "library_600x900.jpg";

struct ParsableManifestData {
    app_id: String,
    title: String,
    install_dir_name: String,
}

// UTILS --------------------------------------------------------------------------------
/// Used for checking if a file name matches the structure for an app manifest file
#[tracing::instrument(level = "trace")]
fn parse_manifest_filename(filename: &str) -> IResult<&str, &str> {
    delimited(
        tag("appmanifest_"),
        take_till(|c: char| !c.is_ascii_alphanumeric()),
        tag(".acf"),
    )
    .parse(filename)
}

/// Used for parsing relevant game's data from the given app manifest file's contents. The app ID
/// falls back to the one in the manifest's file name.
#[tracing::instrument(level = "trace", skip(file_content))]
fn parse_game_manifest(
    filename: &str,
    file_content: &str,
) -> Result<ParsableManifestData, GamesParsingError> {
    let (_, app_id_from_filename) = parse_manifest_filename(filename)?;
    let get_value = |key: &str| find_value_vdf(file_content, key).filter(|v| !v.is_empty());

    let app_id = get_value("appid").unwrap_or_else(|| app_id_from_filename.to_owned());
    let (Some(title), Some(install_dir_name)) = (get_value("name"), get_value("installdir")) else {
        return Err(GamesParsingError::Other(format!(
            "name or installdir missing from {filename}"
        )));
    };

    Ok(ParsableManifestData {
        app_id,
        title: clean_game_title(title),
        install_dir_name,
    })
}

pub fn get_steam_launch_target(app_id: &str) -> LaunchTarget {
    LaunchTarget::Protocol(format!("steam://rungameid/{app_id}"))
}

// STEAM LIBRARY ------------------------------------------------------------------------
#[derive(Debug)]
pub struct SteamLibrary<'steamlibrary> {
    /// The library's `steamapps` folder
    path_library: PathBuf,
    path_steam_dir: &'steamlibrary Path,
}

impl SteamLibrary<'_> {
    /// Find and return paths of the app manifest files, sorted by file name
    #[tracing::instrument(level = "trace")]
    fn get_manifest_paths(&self) -> Result<Vec<PathBuf>, GamesParsingError> {
        Ok(get_sorted_files(&self.path_library)?
            .into_iter()
            .filter(|path| {
                get_file_name(path).is_some_and(|filename| {
                    let is_manifest = parse_manifest_filename(&filename).is_ok();
                    if !is_manifest {
                        trace!("{PLATFORM} - File skipped as it is not a manifest: {filename}");
                    }
                    is_manifest
                })
            })
            .collect())
    }

    /// Box art cached by the Steam client, in either the flat or the per-app layout
    fn get_box_art(&self, app_id: &str) -> Option<PathBuf> {
        let path_cache = self.path_steam_dir.join("appcache/librarycache");

        some_if_file(path_cache.join(format!("{app_id}_{BOX_ART_FILE_NAME}")))
            .or_else(|| some_if_file(path_cache.join(app_id).join(BOX_ART_FILE_NAME)))
            .or_else(|| {
                WalkDir::new(path_cache.join(app_id))
                    .min_depth(2)
                    .max_depth(2)
                    .sort_by_file_name()
                    .into_iter()
                    .flatten()
                    .find(|entry| entry.file_name() == BOX_ART_FILE_NAME)
                    .map(|entry| entry.into_path())
            })
    }

    /// Emits a game for the given app manifest file (`appmanifest_*.acf`), unless it's rejected
    #[tracing::instrument(level = "trace", skip(self, state))]
    fn get_game(&self, state: &mut ScanState, path_app_manifest: &Path) {
        state.diagnostics.candidate_seen();

        let file_content = match read_to_string(path_app_manifest) {
            Ok(content) => content,
            Err(e) => {
                error!("{PLATFORM} - Error with reading app manifest at {path_app_manifest:?}:\n{e}");
                state.diagnostics.reject(RejectReason::MalformedEntry);
                return;
            }
        };

        let filename = get_file_name(path_app_manifest).unwrap_or_default();
        let ParsableManifestData {
            app_id,
            title,
            install_dir_name,
        } = match parse_game_manifest(&filename, &file_content) {
            Ok(data) => data,
            Err(e) => {
                trace!("{PLATFORM} - Malformed app manifest at {path_app_manifest:?}: {e}");
                state.diagnostics.reject(RejectReason::MalformedEntry);
                return;
            }
        };

        if EXCLUDED_APP_IDS.contains(&app_id.as_str()) || EXCLUDED_TITLES.contains(&title.as_str())
        {
            trace_rejected!(RejectReason::Excluded, title, path_app_manifest);
            state.diagnostics.reject(RejectReason::Excluded);
            return;
        }

        let Some(path_game_dir) =
            some_if_dir(self.path_library.join("common").join(&install_dir_name))
        else {
            trace_rejected!(RejectReason::MissingInstallDir, title, install_dir_name);
            state.diagnostics.reject(RejectReason::MissingInstallDir);
            return;
        };

        let path_box_art = self.get_box_art(&app_id);
        trace!("{PLATFORM} - Box art found for '{title}': {path_box_art:?}");

        state.emit(
            Game::new(
                format!("{}_{app_id}", PLATFORM.id_prefix()),
                title,
                PLATFORM,
                path_game_dir,
                get_steam_launch_target(&app_id),
            )
            .with_app_id(app_id)
            .with_box_art(path_box_art),
        );
    }

    /// Emits all steam games associated with this library
    #[tracing::instrument(level = "trace", skip(self, state))]
    fn scan(&self, state: &mut ScanState) -> Result<(), GamesParsingError> {
        for path_manifest in self.get_manifest_paths()? {
            self.get_game(state, &path_manifest);
        }

        Ok(())
    }
}

// STEAM --------------------------------------------------------------------------------
#[derive(Debug)]
pub struct Steam {
    path_steam_dir_override: Option<PathBuf>,
    registry: Arc<dyn RegistryReader>,
}

impl Steam {
    pub fn new(path_steam_dir: Option<PathBuf>, registry: Arc<dyn RegistryReader>) -> Self {
        Steam {
            path_steam_dir_override: path_steam_dir,
            registry,
        }
    }

    /// Steam install directory, from the override or the registry
    #[tracing::instrument(level = "trace")]
    fn get_steam_dir(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path_steam_dir_override {
            debug_path!("configured Steam directory", path);
            return some_if_dir(path.clone());
        }

        STEAM_REGISTRY_VALUES.iter().find_map(|(key, value)| {
            let path_steam_dir = self
                .get_registry_path(key, value)
                .inspect_err(|e| {
                    debug_source_unavailable!(key, e);
                })
                .ok()?;

            debug_path!("Steam directory from the registry", path_steam_dir);
            some_if_dir(path_steam_dir)
        })
    }

    /// Path stored in the given registry value
    fn get_registry_path(&self, key: &str, value: &str) -> Result<PathBuf, GamesParsingError> {
        let dump = self.registry.query_value(key, value)?;
        let value_name = value.to_lowercase();

        parse_registry_dump(&dump)
            .iter()
            .find_map(|k| k.get_value(&[value_name.as_str()]))
            .filter(|v| !v.data.is_empty())
            .map(|v| get_native_path(&v.data))
            .ok_or_else(|| GamesParsingError::Registry(format!("no {value} value under {key}")))
    }

    /// All library `steamapps` folders: the main one, then those listed in
    /// `libraryfolders.vdf`, without duplicates
    #[tracing::instrument(level = "trace")]
    pub fn get_steam_libraries(path_steam_dir: &Path) -> Vec<SteamLibrary<'_>> {
        let path_main_library = path_steam_dir.join("steamapps");
        let path_library_folders = path_main_library.join("libraryfolders.vdf");

        let listed = match read_to_string(&path_library_folders) {
            Ok(content) => find_all_values_vdf(&content, "path"),
            Err(e) => {
                debug!("{PLATFORM} - Could not read {path_library_folders:?}: {e}");
                Vec::new()
            }
        };

        let mut seen = Vec::new();
        std::iter::once(path_main_library)
            .chain(
                listed
                    .iter()
                    .map(|path| get_native_path(path).join("steamapps")),
            )
            .filter(|path| {
                let key = get_path_key(path);
                if seen.contains(&key) {
                    return false;
                }
                seen.push(key);
                path.is_dir()
            })
            .map(|path_library| SteamLibrary {
                path_library,
                path_steam_dir,
            })
            .collect()
    }
}

impl Scanner for Steam {
    fn get_platform(&self) -> Platform {
        PLATFORM
    }

    fn is_detected(&self, _ctx: &ScanContext) -> bool {
        self.get_steam_dir().is_some()
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();
        state.diagnostics.source_tried();

        let Some(path_steam_dir) = self.get_steam_dir() else {
            debug_source_unavailable!("install directory", "not found");
            state.diagnostics.source_unavailable();
            return Ok(state.into_outcome());
        };

        let libraries = Self::get_steam_libraries(&path_steam_dir);
        debug!("{PLATFORM} - Libraries detected: {libraries:?}");

        for library in libraries {
            ctx.check_cancelled()?;
            state.diagnostics.source_tried();

            if let Err(e) = library.scan(&mut state) {
                debug_source_unavailable!(library.path_library.display(), e);
                state.diagnostics.source_unavailable();
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
    use test_case::test_case;

    use super::*;
    use crate::system::registry::StaticRegistry;

    fn write_manifest(
        path_library: &Path,
        app_id: &str,
        name: &str,
        install_dir: &str,
    ) -> Result<(), GamesParsingError> {
        create_dir_all(path_library.join("common").join(install_dir))?;
        write(
            path_library.join(format!("appmanifest_{app_id}.acf")),
            format!(
                "\"AppState\"\n{{\n\t\"appid\"\t\t\"{app_id}\"\n\t\"name\"\t\t\"{name}\"\n\t\"installdir\"\t\t\"{install_dir}\"\n}}\n"
            ),
        )?;
        Ok(())
    }

    #[test_case("appmanifest_730.acf", true)]
    #[test_case("appmanifest_1517290.acf", true)]
    #[test_case("libraryfolders.vdf", false)]
    #[test_case("appmanifest_730.tmp", false)]
    fn test_parse_manifest_filename(filename: &str, is_manifest: bool) {
        assert_eq!(parse_manifest_filename(filename).is_ok(), is_manifest);
    }

    #[test]
    fn test_parse_game_manifest() -> Result<(), GamesParsingError> {
        // App ID missing from the contents
        let data = parse_game_manifest(
            "appmanifest_620.acf",
            "\"AppState\"\n{\n\t\"name\"\t\t\"Portal 2™\"\n\t\"installdir\"\t\t\"Portal 2\"\n}\n",
        )?;
        assert_eq!(data.app_id, "620");
        assert_eq!(data.title, "Portal 2");
        assert_eq!(data.install_dir_name, "Portal 2");

        assert!(matches!(
            parse_game_manifest("libraryfolders.vdf", ""),
            Err(GamesParsingError::Nom(_))
        ));
        assert!(matches!(
            parse_game_manifest("appmanifest_7.acf", "garbage"),
            Err(GamesParsingError::Other(_))
        ));

        Ok(())
    }

    #[test]
    fn test_steam_scanner() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let path_steam = dir.path().join("Steam");
        let path_main = path_steam.join("steamapps");
        let path_second = dir.path().join("SteamLibrary/steamapps");

        write_manifest(&path_main, "730", "Counter-Strike 2", "Counter-Strike Global Offensive")?;
        write_manifest(&path_main, "228980", "Steamworks Common Redistributables", "Steamworks Shared")?;
        write_manifest(&path_second, "1517290", "Battlefield™ 2042", "Battlefield 2042")?;
        // Manifest whose install folder was deleted
        write(
            path_second.join("appmanifest_42.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"42\"\n\t\"name\"\t\t\"Gone\"\n\t\"installdir\"\t\t\"Gone\"\n}\n",
        )?;
        write(path_second.join("appmanifest_7.acf"), "garbage")?;

        write(
            path_main.join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n\t\"1\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
                path_steam.display(),
                dir.path().join("SteamLibrary").display(),
            ),
        )?;

        let path_box_art = path_steam.join("appcache/librarycache/730");
        create_dir_all(&path_box_art)?;
        write(path_box_art.join(BOX_ART_FILE_NAME), "")?;

        let scanner = Steam::new(Some(path_steam.clone()), Arc::new(StaticRegistry::new()));
        let ctx = ScanContext::new(Vec::new(), 4);
        assert!(scanner.is_detected(&ctx));

        let outcome = scanner.scan(&ctx)?;
        let games = &outcome.games;

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "steam_730");
        assert_eq!(games[0].name, "Counter-Strike 2");
        assert_eq!(
            games[0].launch_target,
            LaunchTarget::Protocol("steam://rungameid/730".to_owned())
        );
        assert_eq!(
            games[0].install_dir,
            path_main.join("common/Counter-Strike Global Offensive")
        );
        assert_eq!(
            games[0].path_box_art,
            Some(path_box_art.join(BOX_ART_FILE_NAME))
        );
        assert_eq!(games[1].id, "steam_1517290");
        assert_eq!(games[1].name, "Battlefield 2042");
        assert_eq!(games[1].app_id.as_deref(), Some("1517290"));

        let diagnostics = &outcome.diagnostics;
        assert_eq!(diagnostics.rejected_for(RejectReason::Excluded), 1);
        assert_eq!(diagnostics.rejected_for(RejectReason::MissingInstallDir), 1);
        assert_eq!(diagnostics.rejected_for(RejectReason::MalformedEntry), 1);

        Ok(())
    }

    #[test]
    fn test_steam_dir_from_registry() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let path_steam = dir.path().join("Steam");
        write_manifest(&path_steam.join("steamapps"), "620", "Portal 2", "Portal 2")?;

        let registry = StaticRegistry::new().with_dump(
            "HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Valve\\Steam",
            format!(
                "\nHKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Valve\\Steam\n    InstallPath    REG_SZ    {}\n\n",
                path_steam.display()
            ),
        );

        let scanner = Steam::new(None, Arc::new(registry));
        let games = scanner.get_detected_games(&ScanContext::new(Vec::new(), 4))?;

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Portal 2");

        Ok(())
    }

    #[test]
    fn test_registry_key_without_install_path() {
        let key = "HKEY_LOCAL_MACHINE\\SOFTWARE\\Valve\\Steam";
        let registry = StaticRegistry::new().with_dump(
            key,
            "\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Valve\\Steam\n    Language    REG_SZ    english\n\n",
        );
        let scanner = Steam::new(None, Arc::new(registry));

        assert!(matches!(
            scanner.get_registry_path(key, "InstallPath"),
            Err(GamesParsingError::Registry(_))
        ));
        assert!(matches!(
            scanner.get_registry_path("HKEY_CURRENT_USER\\Software\\Valve\\Steam", "SteamPath"),
            Err(GamesParsingError::Io(_))
        ));
    }

    #[test]
    fn test_steam_not_installed() -> Result<(), GamesParsingError> {
        let scanner = Steam::new(None, Arc::new(StaticRegistry::new()));
        let ctx = ScanContext::new(Vec::new(), 4);

        assert!(!scanner.is_detected(&ctx));

        let outcome = scanner.scan(&ctx)?;
        assert!(outcome.games.is_empty());
        assert_eq!(outcome.diagnostics.sources_unavailable, 1);

        Ok(())
    }
}
