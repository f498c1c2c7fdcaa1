use std::{
    fs::read_dir,
    io,
    path::{MAIN_SEPARATOR, Path, PathBuf},
};

use itertools::Itertools;

/// Returns an Option containing the given `PathBuf`, if the `PathBuf` points to an actual file
pub fn some_if_file(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Returns an Option containing the given `PathBuf`, if the `PathBuf` points to an actual directory
pub fn some_if_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

/// Returns the sub-directories of the given directory, sorted by file name
///
/// Entries which can't be read or inspected are skipped.
pub fn get_sorted_sub_dirs(path: &Path) -> Result<Vec<PathBuf>, io::Error> {
    Ok(read_dir(path)?
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.path())
        .sorted()
        .collect())
}

/// Returns the files directly inside the given directory, sorted by file name
pub fn get_sorted_files(path: &Path) -> Result<Vec<PathBuf>, io::Error> {
    Ok(read_dir(path)?
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .sorted()
        .collect())
}

/// Returns the final component of a path as an owned string
pub fn get_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}

/// Builds a path from a string which may use either separator style
pub fn get_native_path(raw: &str) -> PathBuf {
    let foreign = if MAIN_SEPARATOR == '\\' { '/' } else { '\\' };
    PathBuf::from(raw.trim().replace(foreign, &MAIN_SEPARATOR.to_string()))
}

/// Case insensitive key for a path, used to recognise the same directory reached twice
pub fn get_path_key(path: &Path) -> String {
    path.to_string_lossy()
        .trim_end_matches(['/', '\\'])
        .to_lowercase()
}

/// Returns the root path of a drive given as a letter, e.g. `"C:"` -> `C:\`.
///
/// Anything that isn't a bare drive letter is returned untouched.
pub fn get_drive_root(drive: &str) -> PathBuf {
    let mut chars = drive.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic() => {
            PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase()))
        }
        _ => PathBuf::from(drive),
    }
}
