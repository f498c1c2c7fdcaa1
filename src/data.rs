//! Data structures shared by every scanner, and the traits which tie them together.
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    path::PathBuf,
    process::Command,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    error::GamesParsingError,
    utils::{get_launch_command, get_launch_command_protocol},
};

/// Data structure representing a supported distribution platform.
///
/// The variant order is the order in which buckets appear in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Platform {
    Steam,
    Epic,
    Rockstar,
    Riot,
    Ea,
    Ubisoft,
    Xbox,
    Custom,
}

impl Platform {
    /// Every platform, in catalog order
    pub const ALL: [Platform; 8] = [
        Platform::Steam,
        Platform::Epic,
        Platform::Rockstar,
        Platform::Riot,
        Platform::Ea,
        Platform::Ubisoft,
        Platform::Xbox,
        Platform::Custom,
    ];

    /// Prefix used for the [`Game::id`] of every game found for this platform
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Platform::Steam => "steam",
            Platform::Epic => "epic",
            Platform::Rockstar => "rockstar",
            Platform::Riot => "riot",
            Platform::Ea => "ea",
            Platform::Ubisoft => "ubisoft",
            Platform::Xbox => "xbox",
            Platform::Custom => "custom",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Platform::Steam => "Steam",
                Platform::Epic => "Epic Games Store",
                Platform::Rockstar => "Rockstar Games",
                Platform::Riot => "Riot Games",
                Platform::Ea => "EA",
                Platform::Ubisoft => "Ubisoft Connect",
                Platform::Xbox => "Xbox",
                Platform::Custom => "Custom",
            }
        )
    }
}

/// How a game gets started. The variant is the discriminator the launch step keys off.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "target", rename_all = "snake_case"))]
pub enum LaunchTarget {
    /// Direct path to the game executable
    Executable(PathBuf),
    /// Protocol URI handled by a platform client, e.g. `steam://rungameid/730`
    Protocol(String),
    /// Executable plus arguments, run through a shell wrapper
    CommandLine { program: PathBuf, args: Vec<String> },
}

impl LaunchTarget {
    /// Builds the [`Command`] which would start this target
    pub fn to_command(&self) -> Command {
        match self {
            LaunchTarget::Executable(path) => {
                let mut command = get_launch_command(path.as_os_str(), [], []);
                if let Some(parent) = path.parent() {
                    command.current_dir(parent);
                }
                command
            }
            LaunchTarget::Protocol(uri) => get_launch_command_protocol(uri),
            LaunchTarget::CommandLine { program, args } => {
                get_launch_command(program.as_os_str(), args.iter().map(String::as_str), [])
            }
        }
    }

    /// Whether this target has to be run through a shell wrapper
    pub fn is_command_line(&self) -> bool {
        matches!(self, LaunchTarget::CommandLine { .. })
    }
}

impl Display for LaunchTarget {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LaunchTarget::Executable(path) => write!(f, "{}", path.display()),
            LaunchTarget::Protocol(uri) => write!(f, "{uri}"),
            LaunchTarget::CommandLine { program, args } => {
                write!(f, "\"{}\"", program.display())?;
                args.iter().try_for_each(|arg| write!(f, " {arg}"))
            }
        }
    }
}

/// Platform specific hints for the launch step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameFlags {
    /// The launch target is delegated to an external client service
    pub requires_client_service: bool,
    /// Normal launch mechanics are known to fail, a protocol based recovery should be attempted
    pub needs_fallback: bool,
}

/// Data structure which defines all relevant data about any particular game
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Game {
    /// Stable key, unique within a [`Catalog`]
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub install_dir: PathBuf,
    pub launch_target: LaunchTarget,
    /// Remote cover image, only set by custom entries and cover overrides
    pub cover_url: Option<String>,
    /// Local image shipped with the game, when the platform has one
    pub path_box_art: Option<PathBuf>,
    /// Authoritative application identifier, when the platform exposes one
    pub app_id: Option<String>,
    pub flags: GameFlags,
    pub play_time_minutes: u64,
}

impl Game {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        platform: Platform,
        install_dir: impl Into<PathBuf>,
        launch_target: LaunchTarget,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform,
            install_dir: install_dir.into(),
            launch_target,
            cover_url: None,
            path_box_art: None,
            app_id: None,
            flags: GameFlags::default(),
            play_time_minutes: 0,
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_flags(mut self, flags: GameFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_box_art(mut self, path_box_art: Option<PathBuf>) -> Self {
        self.path_box_art = path_box_art;
        self
    }
}

/// Custom Result type for Games
pub type GamesResult = Result<Vec<Game>, GamesParsingError>;

/// Cooperative cancellation flag, checked by scanners between drives, folders and sources
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears a previous cancellation, for reuse by the next scan
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Everything a scanner needs from the surrounding scan session
#[derive(Debug, Clone)]
pub struct ScanContext {
    /// Volume roots, enumerated once per session
    pub drives: Arc<[PathBuf]>,
    /// Depth budget for executable resolution
    pub max_depth: usize,
    pub cancel: CancellationToken,
}

impl ScanContext {
    pub fn new(drives: impl Into<Arc<[PathBuf]>>, max_depth: usize) -> Self {
        Self {
            drives: drives.into(),
            max_depth,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns [`GamesParsingError::Cancelled`] once cancellation was requested
    pub fn check_cancelled(&self) -> Result<(), GamesParsingError> {
        if self.cancel.is_cancelled() {
            Err(GamesParsingError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Every `drive/folder` combination, drive order first
    pub fn paths_on_drives<'a>(
        &'a self,
        folders: &'a [&'a str],
    ) -> impl Iterator<Item = PathBuf> + 'a {
        self.drives
            .iter()
            .flat_map(move |drive| folders.iter().map(move |folder| drive.join(folder)))
    }
}

/// Why a candidate was not turned into a [`Game`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    OwnedBySteam,
    NoExecutable,
    Duplicate,
    InvalidName,
    MissingInstallDir,
    Excluded,
    MalformedEntry,
}

/// Per-scanner counters, so that a missing game can be explained without failing the scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanDiagnostics {
    pub sources_tried: usize,
    pub sources_unavailable: usize,
    pub candidates_seen: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl ScanDiagnostics {
    pub fn source_tried(&mut self) {
        self.sources_tried += 1;
    }

    pub fn source_unavailable(&mut self) {
        self.sources_unavailable += 1;
    }

    pub fn candidate_seen(&mut self) {
        self.candidates_seen += 1;
    }

    pub fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    /// Number of candidates rejected for the given reason
    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or_default()
    }
}

/// Successful result of a single scanner run
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub games: Vec<Game>,
    pub diagnostics: ScanDiagnostics,
}

/// Per-platform summary of a [`GamesDetector::scan_all`] run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanReport {
    pub platform: Platform,
    pub games_found: usize,
    pub diagnostics: ScanDiagnostics,
    /// Reason the scanner failed as a whole, in which case its bucket is empty
    pub failure: Option<String>,
}

pub type GamesPerPlatform = Vec<(Platform, Vec<Game>)>;

/// Result of a full scan: one bucket per [`Platform`], in [`Platform::ALL`] order
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Catalog {
    buckets: GamesPerPlatform,
    reports: Vec<ScanReport>,
}

impl Catalog {
    pub(crate) fn new(mut buckets: GamesPerPlatform, reports: Vec<ScanReport>) -> Self {
        buckets.sort_by_key(|(platform, _)| *platform);
        Self { buckets, reports }
    }

    /// Games found for a single platform
    pub fn get(&self, platform: Platform) -> &[Game] {
        self.buckets
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, games)| games.as_slice())
            .unwrap_or_default()
    }

    pub fn buckets(&self) -> &[(Platform, Vec<Game>)] {
        &self.buckets
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.buckets.iter().flat_map(|(_, games)| games)
    }

    pub fn reports(&self) -> &[ScanReport] {
        &self.reports
    }

    pub fn report(&self, platform: Platform) -> Option<&ScanReport> {
        self.reports.iter().find(|r| r.platform == platform)
    }

    pub fn into_buckets(self) -> GamesPerPlatform {
        self.buckets
    }

    /// Returns a new catalog with every game passed through `f`, reports untouched
    pub(crate) fn map_games(self, mut f: impl FnMut(Game) -> Game) -> Self {
        Self {
            buckets: self
                .buckets
                .into_iter()
                .map(|(platform, games)| (platform, games.into_iter().map(&mut f).collect()))
                .collect(),
            reports: self.reports,
        }
    }
}

// Game discovery is divided up by "scanners", each responsible for exactly one platform
pub trait Scanner: Send + Sync + Debug {
    fn get_platform(&self) -> Platform;
    /// Cheap check for whether the platform looks present at all
    fn is_detected(&self, ctx: &ScanContext) -> bool;
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError>;

    /// Convenience wrapper returning only the games
    fn get_detected_games(&self, ctx: &ScanContext) -> GamesResult {
        self.scan(ctx).map(|outcome| outcome.games)
    }
}
pub type Scanners = Vec<Arc<dyn Scanner>>;

pub trait GamesDetector {
    /// Runs every scanner, never failing: broken scanners yield empty buckets
    fn scan_all(&self) -> Catalog;
    fn get_detected_scanners(&self) -> Scanners;
    fn get_all_detected_games(&self) -> Vec<Game>;
    fn get_all_detected_games_per_platform(&self) -> GamesPerPlatform;
    fn get_all_detected_games_from_specific_platform(&self, platform: Platform)
    -> Option<Vec<Game>>;
}
