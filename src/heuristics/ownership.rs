use std::{fs::read_dir, path::Path};

use tracing::trace;

/// Steam's library folder name; anything below it is managed by Steam
pub const STEAM_LIBRARY_FOLDER: &str = "steamapps";

/// Files which only Steam (or a Steam emulator) puts in an install root. `steam_api.dll` is
/// missing on purpose: plenty of games from other stores ship it.
pub const STEAM_MARKER_FILES: &[&str] = &["steam_appid.txt", "installscript.vdf", "steam_emu.ini"];

/// Whether the given directory is proven to belong to Steam.
///
/// Checks, in order: the path containing Steam's library folder name, then marker files directly
/// inside the directory or any of its ancestors (non-recursive listings only). Unreadable
/// directories count as not owned, so callers err on the side of reporting the game.
#[tracing::instrument(level = "trace")]
pub fn is_owned_by_steam(dir: &Path) -> bool {
    if dir
        .to_string_lossy()
        .to_lowercase()
        .contains(STEAM_LIBRARY_FOLDER)
    {
        trace!("Steam library folder in path: {dir:?}");
        return true;
    }

    dir.ancestors().any(has_steam_marker_file)
}

fn has_steam_marker_file(dir: &Path) -> bool {
    let Ok(entries) = read_dir(dir) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let file_name = entry.file_name().to_string_lossy().to_lowercase();
        let is_marker = STEAM_MARKER_FILES.contains(&file_name.as_str());
        if is_marker {
            trace!("Steam marker file found: {:?}", entry.path());
        }
        is_marker
    })
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{create_dir_all, write},
        io,
    };

    use test_case::test_case;

    use super::*;

    #[test_case("steam_appid.txt")]
    #[test_case("STEAM_APPID.TXT")]
    #[test_case("installscript.vdf")]
    #[test_case("steam_emu.ini")]
    fn test_marker_file_means_owned(marker: &str) -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let game = dir.path().join("Battlefield 2042");
        create_dir_all(&game)?;
        write(game.join(marker), "1517290")?;

        assert!(is_owned_by_steam(&game));

        Ok(())
    }

    #[test]
    fn test_marker_in_ancestor_means_owned() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let game = dir.path().join("Dead Space");
        let nested = game.join("Binaries/Win64");
        create_dir_all(&nested)?;
        write(game.join("steam_appid.txt"), "1693980")?;

        assert!(is_owned_by_steam(&nested));

        Ok(())
    }

    #[test]
    fn test_library_folder_in_path_means_owned() {
        assert!(is_owned_by_steam(Path::new(
            "/does/not/exist/SteamApps/common/Far Cry 5"
        )));
    }

    #[test]
    fn test_other_files_do_not_mean_owned() -> Result<(), io::Error> {
        let dir = tempfile::tempdir()?;
        let game = dir.path().join("Anno 1800");
        create_dir_all(&game)?;
        write(game.join("steam_api64.dll"), "")?;
        write(game.join("uplay_install.state"), "")?;

        assert!(!is_owned_by_steam(&game));

        Ok(())
    }

    #[test]
    fn test_unreadable_directory_is_not_owned() {
        assert!(!is_owned_by_steam(Path::new("/does/not/exist/Anno 1800")));
    }
}
