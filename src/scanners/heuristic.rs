//! Shared discovery engine for platforms without a reliable manifest: default install folders,
//! then registry install locations, then keyword matched folders on every drive.
use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, trace, warn};

use super::ScanState;
use crate::{
    data::{Game, LaunchTarget, Platform, RejectReason, ScanContext, ScanOutcome, Scanner},
    error::GamesParsingError,
    heuristics::{ExclusionRules, ExecutableResolver, is_owned_by_steam},
    system::registry::{RegistryReader, parse_registry_dump},
    utils::{
        clean_folder_name, contains_any_ignore_case, get_file_name, get_id_slug, get_native_path,
        get_sorted_sub_dirs,
    },
};

/// Static description of where and how to look for one platform's games
#[derive(Debug)]
pub struct HeuristicProfile {
    pub platform: Platform,
    /// Client managed library folders, relative to each `Program Files` root. Every sub-directory
    /// is a candidate.
    pub default_folders: &'static [&'static str],
    /// Keys dumped recursively; every sub-key carrying an install location is a candidate
    pub registry_roots: &'static [&'static str],
    /// Install location value names, lowercase without spaces
    pub install_value_names: &'static [&'static str],
    /// Folders relative to each drive root whose sub-directories are candidates if their name
    /// contains a keyword
    pub search_folders: &'static [&'static str],
    pub keywords: &'static [&'static str],
    /// Registry key names which belong to the platform's own software
    pub invalid_names: &'static [&'static str],
    /// Name fragments rejected from every source
    pub excluded_fragments: &'static [&'static str],
    pub min_name_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    DefaultFolder,
    Registry,
    KeywordFolder,
}

impl Display for CandidateSource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CandidateSource::DefaultFolder => "default folder",
                CandidateSource::Registry => "registry",
                CandidateSource::KeywordFolder => "keyword folder",
            }
        )
    }
}

#[derive(Debug)]
struct Candidate {
    raw_name: String,
    dir: PathBuf,
    source: CandidateSource,
}

// HEURISTIC SCANNER --------------------------------------------------------------------
#[derive(Debug)]
pub struct HeuristicScanner {
    profile: &'static HeuristicProfile,
    path_default_dirs: Vec<PathBuf>,
    registry: Arc<dyn RegistryReader>,
    rules: ExclusionRules,
}

impl HeuristicScanner {
    pub fn new(
        profile: &'static HeuristicProfile,
        program_files: &[PathBuf],
        registry: Arc<dyn RegistryReader>,
    ) -> Self {
        let path_default_dirs = program_files
            .iter()
            .flat_map(|root| profile.default_folders.iter().map(|f| root.join(f)))
            .collect();

        Self {
            profile,
            path_default_dirs,
            registry,
            rules: ExclusionRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: ExclusionRules) -> Self {
        self.rules = rules;
        self
    }

    /// Validates a cleaned name, returning the rejection reason if it isn't a plausible title
    fn check_name(&self, name: &str, source: CandidateSource) -> Result<(), RejectReason> {
        if name.is_empty() {
            return Err(RejectReason::InvalidName);
        }

        if contains_any_ignore_case(name, self.profile.excluded_fragments) {
            return Err(RejectReason::Excluded);
        }

        // Registry key names are frequently IDs or the platform's own components
        if source == CandidateSource::Registry {
            let lowercase = name.to_lowercase();
            if name.chars().all(|c| c.is_ascii_digit())
                || name.chars().count() < self.profile.min_name_len
                || self.profile.invalid_names.contains(&lowercase.as_str())
            {
                return Err(RejectReason::InvalidName);
            }
        }

        Ok(())
    }

    /// Runs a candidate through the acceptance pipeline, emitting a game if it passes
    #[tracing::instrument(level = "trace", skip(self, ctx, state))]
    fn consider(&self, ctx: &ScanContext, state: &mut ScanState, candidate: Candidate) {
        let platform = self.profile.platform;
        let Candidate {
            raw_name,
            dir,
            source,
        } = candidate;

        state.diagnostics.candidate_seen();

        let name = clean_folder_name(&raw_name);
        let id = format!("{}_{}", platform.id_prefix(), get_id_slug(&name));

        let verdict = self
            .check_name(&name, source)
            .and_then(|_| {
                if state.found.contains(&id, &dir) {
                    Err(RejectReason::Duplicate)
                } else if !dir.is_dir() {
                    Err(RejectReason::MissingInstallDir)
                } else if is_owned_by_steam(&dir) {
                    Err(RejectReason::OwnedBySteam)
                } else {
                    Ok(())
                }
            })
            .and_then(|_| {
                ExecutableResolver::new(ctx.max_depth)
                    .with_rules(self.rules)
                    .resolve(&dir)
                    .ok_or(RejectReason::NoExecutable)
            });

        match verdict {
            Ok(path_exe) => {
                debug!("{platform} - Found '{name}' ({source}) at {path_exe:?}");
                state.emit(Game::new(
                    id,
                    name,
                    platform,
                    dir,
                    LaunchTarget::Executable(path_exe),
                ));
            }
            Err(reason) => {
                trace!("{platform} - Skipped '{raw_name}' ({source}) at {dir:?}: {reason:?}");
                state.diagnostics.reject(reason);
            }
        }
    }

    /// Lists the sub-directories of a folder source, recording it as unavailable if unreadable
    fn get_folder_source(&self, state: &mut ScanState, path: &Path) -> Option<Vec<PathBuf>> {
        state.diagnostics.source_tried();

        match get_sorted_sub_dirs(path) {
            Ok(dirs) => Some(dirs),
            Err(e) => {
                trace!(
                    "{} - Folder source unavailable {path:?}: {e}",
                    self.profile.platform
                );
                state.diagnostics.source_unavailable();
                None
            }
        }
    }

    // PASSES -------------------------------------------------------------------------------
    fn scan_default_folders(
        &self,
        ctx: &ScanContext,
        state: &mut ScanState,
    ) -> Result<(), GamesParsingError> {
        for path_default_dir in &self.path_default_dirs {
            ctx.check_cancelled()?;

            let Some(dirs) = self.get_folder_source(state, path_default_dir) else {
                continue;
            };

            for dir in dirs {
                ctx.check_cancelled()?;

                let Some(raw_name) = get_file_name(&dir) else {
                    continue;
                };
                self.consider(
                    ctx,
                    state,
                    Candidate {
                        raw_name,
                        dir,
                        source: CandidateSource::DefaultFolder,
                    },
                );
            }
        }

        Ok(())
    }

    fn scan_registry(
        &self,
        ctx: &ScanContext,
        state: &mut ScanState,
    ) -> Result<(), GamesParsingError> {
        let platform = self.profile.platform;

        for root in self.profile.registry_roots {
            ctx.check_cancelled()?;
            state.diagnostics.source_tried();

            let dump = match self.registry.query_tree(root) {
                Ok(dump) => dump,
                Err(e) => {
                    debug!("{platform} - Registry source unavailable ({root}): {e}");
                    state.diagnostics.source_unavailable();
                    continue;
                }
            };

            for key in parse_registry_dump(&dump) {
                ctx.check_cancelled()?;

                let Some(value) = key.get_value(self.profile.install_value_names) else {
                    continue;
                };

                if value.data.trim().is_empty() {
                    state.diagnostics.reject(RejectReason::MalformedEntry);
                    continue;
                }

                self.consider(
                    ctx,
                    state,
                    Candidate {
                        raw_name: key.name().to_owned(),
                        dir: get_native_path(&value.data),
                        source: CandidateSource::Registry,
                    },
                );
            }
        }

        Ok(())
    }

    fn scan_keyword_folders(
        &self,
        ctx: &ScanContext,
        state: &mut ScanState,
    ) -> Result<(), GamesParsingError> {
        for path_search_dir in ctx.paths_on_drives(self.profile.search_folders) {
            ctx.check_cancelled()?;

            if !path_search_dir.is_dir() {
                continue;
            }

            let Some(dirs) = self.get_folder_source(state, &path_search_dir) else {
                continue;
            };

            for dir in dirs {
                ctx.check_cancelled()?;

                let Some(raw_name) = get_file_name(&dir) else {
                    continue;
                };

                if !contains_any_ignore_case(&raw_name, self.profile.keywords) {
                    continue;
                }

                self.consider(
                    ctx,
                    state,
                    Candidate {
                        raw_name,
                        dir,
                        source: CandidateSource::KeywordFolder,
                    },
                );
            }
        }

        Ok(())
    }
}

impl Scanner for HeuristicScanner {
    fn get_platform(&self) -> Platform {
        self.profile.platform
    }

    fn is_detected(&self, ctx: &ScanContext) -> bool {
        self.path_default_dirs.iter().any(|p| p.is_dir())
            || self
                .profile
                .registry_roots
                .iter()
                .any(|root| self.registry.query_tree(root).is_ok())
            || ctx
                .paths_on_drives(self.profile.search_folders)
                .any(|p| p.is_dir())
    }

    #[tracing::instrument(level = "trace", skip(ctx))]
    fn scan(&self, ctx: &ScanContext) -> Result<ScanOutcome, GamesParsingError> {
        let mut state = ScanState::default();

        self.scan_default_folders(ctx, &mut state)?;
        self.scan_registry(ctx, &mut state)?;
        self.scan_keyword_folders(ctx, &mut state)?;

        if state.games.is_empty() {
            warn!("{} - No games found", self.profile.platform);
        }

        Ok(state.into_outcome())
    }
}
