//! The aggregator: runs every platform scanner against one scan session and collects the results
//! into a [`Catalog`], isolating scanner failures from each other.
use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    sync::Arc,
};

use tracing::{debug, error, info, warn};

use crate::{
    config::ScanConfig,
    data::{
        CancellationToken, Catalog, Game, GamesDetector, GamesPerPlatform, Platform, ScanContext,
        ScanReport, Scanner, Scanners,
    },
    error::GamesParsingError,
    overlays::Overlays,
    scanners::{CustomGames, Epic, HeuristicScanner, Riot, Rockstar, Steam, Xbox},
    system::{
        drives::{DriveEnumerator, SystemDrives},
        registry::{RegQuery, RegistryReader},
    },
};

#[derive(Debug)]
pub struct Detector {
    scanners: Scanners,
    drives: Arc<dyn DriveEnumerator>,
    max_depth: usize,
    path_play_stats: PathBuf,
    path_cover_overrides: PathBuf,
    /// Fixed overlays replacing the files above
    overlays: Option<Overlays>,
    cancel: CancellationToken,
}

impl Detector {
    /// Detector using the live registry and the system's drives
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_sources(
            config,
            Arc::new(RegQuery),
            Arc::new(SystemDrives::new(&config.fallback_drives)),
        )
    }

    /// Detector reading the registry and the drive list from the given sources
    pub fn with_sources(
        config: &ScanConfig,
        registry: Arc<dyn RegistryReader>,
        drives: Arc<dyn DriveEnumerator>,
    ) -> Self {
        Detector {
            scanners: Self::get_scanners(config, registry),
            drives,
            max_depth: config.max_depth,
            path_play_stats: config.path_play_stats.clone(),
            path_cover_overrides: config.path_cover_overrides.clone(),
            overlays: None,
            cancel: CancellationToken::new(),
        }
    }

    /// One scanner per platform, in catalog order
    pub fn get_scanners(config: &ScanConfig, registry: Arc<dyn RegistryReader>) -> Scanners {
        let program_files = &config.program_files;

        vec![
            Arc::new(Steam::new(config.steam_root.clone(), registry.clone())),
            Arc::new(Epic::new(&config.program_data)),
            Arc::new(Rockstar::new()),
            Arc::new(Riot::new(&config.program_data)),
            Arc::new(HeuristicScanner::new_ea(program_files, registry.clone())),
            Arc::new(HeuristicScanner::new_ubisoft(program_files, registry)),
            Arc::new(Xbox::new()),
            Arc::new(CustomGames::new(config.path_custom_games.clone())),
        ]
    }

    /// Replaces the play statistics and cover overrides applied by [`GamesDetector::scan_all`],
    /// which are otherwise read from disk on every scan
    pub fn with_overlays(mut self, overlays: Overlays) -> Self {
        self.overlays = Some(overlays);
        self
    }

    fn get_overlays(&self) -> Overlays {
        self.overlays.clone().unwrap_or_else(|| {
            Overlays::load(&self.path_play_stats, &self.path_cover_overrides)
        })
    }

    /// Token which stops the scan in progress, or the next one if none is running. Scanners cut
    /// short by it report [`GamesParsingError::Cancelled`] and leave their bucket empty. The token
    /// is cleared once that scan returns, so the detector stays usable.
    pub fn get_cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// New scan session. Drives are enumerated here, once, and shared by every scanner.
    fn get_context(&self) -> ScanContext {
        let drives = self.drives.get_drives();
        debug!("Scanning drives: {drives:?}");

        ScanContext::new(drives, self.max_depth).with_cancellation(self.cancel.clone())
    }

    /// Runs a single scanner, turning both errors and panics into an empty bucket plus a report
    #[tracing::instrument(level = "debug", skip(ctx))]
    fn run_scanner(scanner: &Arc<dyn Scanner>, ctx: &ScanContext) -> (Vec<Game>, ScanReport) {
        let platform = scanner.get_platform();

        let result = catch_unwind(AssertUnwindSafe(|| scanner.scan(ctx)))
            .unwrap_or_else(|panic| Err(GamesParsingError::Other(get_panic_message(panic))));

        match result {
            Ok(outcome) => {
                debug!("{platform} - {} games found", outcome.games.len());
                let report = ScanReport {
                    platform,
                    games_found: outcome.games.len(),
                    diagnostics: outcome.diagnostics,
                    failure: None,
                };
                (outcome.games, report)
            }
            Err(e) => {
                warn!("{platform} - Scanner failed, no games reported: {e}");
                let report = ScanReport {
                    platform,
                    games_found: 0,
                    diagnostics: Default::default(),
                    failure: Some(e.to_string()),
                };
                (Vec::new(), report)
            }
        }
    }

    /// [`Scanner::is_detected`], with a panic counting as not detected
    fn is_scanner_detected(scanner: &Arc<dyn Scanner>, ctx: &ScanContext) -> bool {
        catch_unwind(AssertUnwindSafe(|| scanner.is_detected(ctx))).unwrap_or_else(|panic| {
            warn!(
                "{} - Detection failed: {}",
                scanner.get_platform(),
                get_panic_message(panic)
            );
            false
        })
    }
}

fn get_panic_message(panic: Box<dyn Any + Send>) -> String {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_owned());

    format!("scanner panicked: {message}")
}

impl GamesDetector for Detector {
    #[tracing::instrument(level = "info", skip(self))]
    fn scan_all(&self) -> Catalog {
        let ctx = self.get_context();

        let (buckets, reports): (GamesPerPlatform, Vec<ScanReport>) = self
            .scanners
            .iter()
            .map(|scanner| {
                let (games, report) = Self::run_scanner(scanner, &ctx);
                ((scanner.get_platform(), games), report)
            })
            .unzip();
        self.cancel.reset();

        let catalog = Catalog::new(buckets, reports).with_overlays(&self.get_overlays());
        info!("Scan complete, {} games found", catalog.games().count());

        catalog
    }

    fn get_detected_scanners(&self) -> Scanners {
        let ctx = self.get_context();

        self.scanners
            .iter()
            .filter(|s| Self::is_scanner_detected(s, &ctx))
            .cloned()
            .collect()
    }

    fn get_all_detected_games(&self) -> Vec<Game> {
        self.scan_all().games().cloned().collect()
    }

    fn get_all_detected_games_per_platform(&self) -> GamesPerPlatform {
        self.scan_all().into_buckets()
    }

    /// `None` when the platform isn't detected, an empty list when its scan failed
    fn get_all_detected_games_from_specific_platform(
        &self,
        platform: Platform,
    ) -> Option<Vec<Game>> {
        let ctx = self.get_context();

        let scanner = self
            .scanners
            .iter()
            .find(|s| s.get_platform() == platform && Self::is_scanner_detected(s, &ctx))?;

        let (games, report) = Self::run_scanner(scanner, &ctx);
        self.cancel.reset();

        if let Some(failure) = report.failure {
            error!("{platform} - Detected but the scan failed: {failure}");
        }

        let overlays = self.get_overlays();
        Some(games.into_iter().map(|game| overlays.apply(game)).collect())
    }
}
