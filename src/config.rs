//! Scan configuration: where platform-owned files live, which drives to fall back to, and where
//! the user's own data (custom games, play statistics, cover overrides) is persisted.
use std::{env, path::PathBuf};

use crate::heuristics::executable::DEFAULT_MAX_DEPTH;

/// Directory name used below the user's data directory
const DATA_DIR_NAME: &str = "lib_game_aggregator";

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Depth budget for executable resolution
    pub max_depth: usize,
    /// Drives used when the system can't be asked for its volumes
    pub fallback_drives: Vec<String>,
    /// `%ProgramData%`, home of the Epic manifests and the Riot installs file
    pub program_data: PathBuf,
    /// `%ProgramFiles%` and `%ProgramFiles(x86)%`
    pub program_files: Vec<PathBuf>,
    /// Skips the registry lookup for the Steam install directory
    pub steam_root: Option<PathBuf>,
    pub path_custom_games: PathBuf,
    pub path_play_stats: PathBuf,
    pub path_cover_overrides: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let path_data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME);

        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            fallback_drives: ["C:", "D:", "E:", "F:"].map(String::from).to_vec(),
            program_data: PathBuf::from("C:\\ProgramData"),
            program_files: vec![
                PathBuf::from("C:\\Program Files"),
                PathBuf::from("C:\\Program Files (x86)"),
            ],
            steam_root: None,
            path_custom_games: path_data.join("custom-games.json"),
            path_play_stats: path_data.join("play-stats.json"),
            path_cover_overrides: path_data.join("custom-covers.json"),
        }
    }
}

impl ScanConfig {
    /// Defaults, with the Windows system folders taken from the environment when set
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(program_data) = env::var_os("ProgramData") {
            config.program_data = PathBuf::from(program_data);
        }

        let program_files = ["ProgramFiles", "ProgramFiles(x86)"]
            .iter()
            .zip(config.program_files.iter())
            .map(|(var, default)| {
                env::var_os(var).map(PathBuf::from).unwrap_or(default.clone())
            })
            .collect();
        config.program_files = program_files;

        config
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_program_data(mut self, program_data: impl Into<PathBuf>) -> Self {
        self.program_data = program_data.into();
        self
    }

    pub fn with_program_files(mut self, program_files: Vec<PathBuf>) -> Self {
        self.program_files = program_files;
        self
    }

    pub fn with_steam_root(mut self, steam_root: impl Into<PathBuf>) -> Self {
        self.steam_root = Some(steam_root.into());
        self
    }

    /// Points every user data file into the given directory
    pub fn with_data_dir(mut self, path_data: impl Into<PathBuf>) -> Self {
        let path_data = path_data.into();
        self.path_custom_games = path_data.join("custom-games.json");
        self.path_play_stats = path_data.join("play-stats.json");
        self.path_cover_overrides = path_data.join("custom-covers.json");
        self
    }
}
