use std::{
    cmp::Reverse,
    path::{Path, PathBuf},
};

use tracing::trace;
use walkdir::{DirEntry, WalkDir};

/// Default depth budget for [`ExecutableResolver`]
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Folder name fragments which are never descended into: installer staging, redistributables,
/// driver installers, logs, crash dumps and temporary files
pub const EXCLUDED_FOLDERS: &[&str] = &[
    "__installer",
    "_commonredist",
    "redist",
    "directx",
    "vcredist",
    "support",
    "logs",
    "crash",
    "temp",
];

/// Executable name fragments which are never the game itself
pub const EXCLUDED_EXECUTABLES: &[&str] = &[
    "uninstall",
    "unins000",
    "cleanup",
    "touchup",
    "repair",
    "crash",
    "dxsetup",
    "vcredist",
    "redist",
    "helper",
    "update",
    "setup",
    "installer",
    "launcher",
    "anticheat",
    "battleye",
    "ealink",
    "eadesktop",
    "ubisoftconnect",
    "uplay",
];

/// Case insensitive name fragments used to prune folders and reject executables
#[derive(Debug, Clone, Copy)]
pub struct ExclusionRules {
    pub folders: &'static [&'static str],
    pub executables: &'static [&'static str],
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            folders: EXCLUDED_FOLDERS,
            executables: EXCLUDED_EXECUTABLES,
        }
    }
}

impl ExclusionRules {
    pub fn is_excluded_folder(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.folders.iter().any(|excluded| name.contains(excluded))
    }

    pub fn is_excluded_executable(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.executables.iter().any(|excluded| name.contains(excluded))
    }
}

/// Finds the "real" game executable inside an install directory.
///
/// All executables within the depth budget which survive the exclusion rules are pooled, and the
/// largest one wins. Ties go to the first candidate in traversal order, which is sorted by file
/// name at every level.
#[derive(Debug, Clone, Copy)]
pub struct ExecutableResolver {
    max_depth: usize,
    rules: ExclusionRules,
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ExecutableResolver {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            rules: ExclusionRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: ExclusionRules) -> Self {
        self.rules = rules;
        self
    }

    /// Returns the most likely game executable below `dir`, where a file directly inside `dir`
    /// has depth 1
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn resolve(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry))
            .filter_map(|res| {
                // Unreadable sub-trees are skipped, the walk carries on with their siblings
                res.inspect_err(|e| trace!("Skipping unreadable entry: {e}"))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file() && self.is_candidate(entry))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some((entry.into_path(), size))
            })
            .min_by_key(|(_, size)| Reverse(*size))
            .map(|(path, _)| path)
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.rules.is_excluded_folder(name))
    }

    fn is_candidate(&self, entry: &DirEntry) -> bool {
        entry.file_name().to_str().is_some_and(|name| {
            is_executable_name(name) && !self.rules.is_excluded_executable(name)
        })
    }
}

/// Whether a file name has the `.exe` extension
pub fn is_executable_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        fs::{File, create_dir_all},
        io,
    };

    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    pub(crate) const MB: u64 = 1024 * 1024;

    /// Creates a (sparse) file of the given size, creating parent directories as needed
    pub(crate) fn create_sized_file(path: &Path, size: u64) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        File::create(path)?.set_len(size)
    }

    #[test_case("uninstall.exe", true)]
    #[test_case("UnityCrashHandler64.exe", true)]
    #[test_case("EALink.exe", true)]
    #[test_case("EasyAntiCheat_EOS_Setup.exe", true)]
    #[test_case("bf2042.exe", false)]
    #[test_case("ACValhalla.exe", false)]
    fn test_is_excluded_executable(name: &str, excluded: bool) {
        assert_eq!(
            ExclusionRules::default().is_excluded_executable(name),
            excluded
        );
    }

    #[test_case("__Installer", true)]
    #[test_case("_CommonRedist", true)]
    #[test_case("DirectX", true)]
    #[test_case("Binaries", false)]
    fn test_is_excluded_folder(name: &str, excluded: bool) {
        assert_eq!(ExclusionRules::default().is_excluded_folder(name), excluded);
    }

    #[test_case("game.exe", true)]
    #[test_case("GAME.EXE", true)]
    #[test_case("game.dll", false)]
    #[test_case("exe", false)]
    fn test_is_executable_name(name: &str, expected: bool) {
        assert_eq!(is_executable_name(name), expected);
    }

    #[test]
    fn test_largest_executable_wins() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("Battlefield 2042");
        create_sized_file(&root.join("Game/bf2042.exe"), 50 * MB)?;
        create_sized_file(&root.join("Game/EALink.exe"), 2 * MB)?;
        create_sized_file(&root.join("small.exe"), MB)?;

        assert_eq!(
            ExecutableResolver::default().resolve(&root),
            Some(root.join("Game/bf2042.exe"))
        );

        Ok(())
    }

    #[test]
    fn test_excluded_executable_never_returned_even_if_largest() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        create_sized_file(&root.join("Uninstall.exe"), 500 * MB)?;
        create_sized_file(&root.join("bin/GameLauncher.exe"), 400 * MB)?;
        create_sized_file(&root.join("bin/game.exe"), 10 * MB)?;

        assert_eq!(
            ExecutableResolver::default().resolve(root),
            Some(root.join("bin/game.exe"))
        );

        Ok(())
    }

    #[test]
    fn test_custom_rules() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        create_sized_file(&root.join("benchmark.exe"), 90 * MB)?;
        create_sized_file(&root.join("game.exe"), MB)?;

        let resolver = ExecutableResolver::default().with_rules(ExclusionRules {
            folders: EXCLUDED_FOLDERS,
            executables: &["benchmark"],
        });
        assert_eq!(resolver.resolve(root), Some(root.join("game.exe")));

        Ok(())
    }

    #[test]
    fn test_excluded_folders_are_pruned() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        create_sized_file(&root.join("_CommonRedist/DirectX/big.exe"), 90 * MB)?;
        create_sized_file(&root.join("game.exe"), MB)?;

        assert_eq!(
            ExecutableResolver::default().resolve(root),
            Some(root.join("game.exe"))
        );

        Ok(())
    }

    #[test]
    fn test_depth_budget() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        let deep = root.join("1/2/3/4/5");
        create_sized_file(&deep.join("game.exe"), MB)?;
        create_dir_all(deep.join("6"))?;

        // `1/2/3/4/5/game.exe` has depth 6
        assert_eq!(ExecutableResolver::new(4).resolve(root), None);
        assert_eq!(
            ExecutableResolver::new(6).resolve(root),
            Some(deep.join("game.exe"))
        );

        Ok(())
    }

    #[test]
    fn test_ties_are_deterministic() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        create_sized_file(&root.join("b.exe"), MB)?;
        create_sized_file(&root.join("a.exe"), MB)?;

        let resolver = ExecutableResolver::default();
        assert_eq!(resolver.resolve(root), Some(root.join("a.exe")));
        assert_eq!(resolver.resolve(root), resolver.resolve(root));

        Ok(())
    }

    #[test]
    fn test_missing_or_empty_directory() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let resolver = ExecutableResolver::default();

        assert_eq!(resolver.resolve(&dir.path().join("missing")), None);
        assert_eq!(resolver.resolve(dir.path()), None);

        Ok(())
    }
}
