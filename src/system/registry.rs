//! Read-only access to the Windows registry through `reg query`, and a structured view of its
//! flat text output.
use std::{collections::HashMap, fmt::Debug, io};

use tracing::trace;

use crate::{
    parsers::{parse_registry_key_line, parse_registry_value_line},
    utils::get_command_stdout,
};

/// Source of `reg query` style text dumps
pub trait RegistryReader: Send + Sync + Debug {
    /// Dump of a single value under a key, `reg query <key> /v <value>`
    fn query_value(&self, key: &str, value: &str) -> Result<String, io::Error>;
    /// Recursive dump of a key and all its sub-keys, `reg query <key> /s`
    fn query_tree(&self, key: &str) -> Result<String, io::Error>;
}

/// Queries the live registry by running `reg.exe`. On other platforms every query fails, which
/// callers treat as an unavailable source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegQuery;

impl RegistryReader for RegQuery {
    fn query_value(&self, key: &str, value: &str) -> Result<String, io::Error> {
        get_command_stdout("reg", ["query", key, "/v", value])
    }

    fn query_tree(&self, key: &str) -> Result<String, io::Error> {
        get_command_stdout("reg", ["query", key, "/s"])
    }
}

/// Registry backed by pre-recorded dumps, keyed by the queried key (case insensitive)
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    dumps: HashMap<String, String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the dump returned for queries of `key`
    pub fn with_dump(mut self, key: &str, dump: impl Into<String>) -> Self {
        self.dumps.insert(key.to_lowercase(), dump.into());
        self
    }

    fn get(&self, key: &str) -> Result<String, io::Error> {
        self.dumps.get(&key.to_lowercase()).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("registry key not found: {key}"),
            )
        })
    }
}

impl RegistryReader for StaticRegistry {
    fn query_value(&self, key: &str, _value: &str) -> Result<String, io::Error> {
        self.get(key)
    }

    fn query_tree(&self, key: &str) -> Result<String, io::Error> {
        self.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryValue {
    pub name: String,
    pub kind: String,
    pub data: String,
}

/// A key and the values listed directly under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKey {
    pub path: String,
    pub values: Vec<RegistryValue>,
}

impl RegistryKey {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            values: Vec::new(),
        }
    }

    /// Last segment of the key path, e.g. `Anno 1800` for `HKEY_...\Ubisoft\Anno 1800`
    pub fn name(&self) -> &str {
        self.path.rsplit('\\').next().unwrap_or(&self.path).trim()
    }

    /// The most recently listed value whose name, ignoring case and spaces, is one of `names`
    /// (given lowercase without spaces)
    pub fn get_value(&self, names: &[&str]) -> Option<&RegistryValue> {
        self.values.iter().rev().find(|value| {
            let normalised: String = value
                .name
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            names.contains(&normalised.as_str())
        })
    }
}

/// States of the dump reader: values only belong to a key once its header line was seen
#[derive(Debug)]
enum DumpState {
    AwaitingKey,
    InKey(RegistryKey),
}

/// Reads flat `reg query` output into its key hierarchy, in listed order.
///
/// Each key header flushes the key accumulated so far, so every value ends up attached to the
/// header preceding it. Lines matching neither pattern (blank lines, error messages) are ignored.
pub fn parse_registry_dump(dump: &str) -> Vec<RegistryKey> {
    let mut keys = Vec::new();
    let mut state = DumpState::AwaitingKey;

    for line in dump.lines() {
        if let Ok((_, path)) = parse_registry_key_line(line) {
            if let DumpState::InKey(key) = state {
                keys.push(key);
            }
            state = DumpState::InKey(RegistryKey::new(path));
        } else if let Ok((_, value)) = parse_registry_value_line(line) {
            match &mut state {
                DumpState::InKey(key) => key.values.push(RegistryValue {
                    name: value.name.to_owned(),
                    kind: value.kind.to_owned(),
                    data: value.data.to_owned(),
                }),
                DumpState::AwaitingKey => {
                    trace!("Registry value without a preceding key skipped: {line:?}")
                }
            }
        }
    }

    if let DumpState::InKey(key) = state {
        keys.push(key);
    }

    keys
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const UBISOFT_DUMP: &str = "
HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Ubisoft
    (Default)    REG_SZ

HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Ubisoft\\Anno 1800
    InstallDir    REG_SZ    C:\\Games\\Anno 1800
    Language    REG_SZ    en-US

HKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Ubisoft\\Launcher\\Installs\\635
    InstallDir    REG_SZ    C:\\Program Files (x86)\\Ubisoft\\games\\Far Cry 5\\
";

    #[test]
    fn test_parse_registry_dump() {
        let keys = parse_registry_dump(UBISOFT_DUMP);

        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].name(), "Ubisoft");
        assert_eq!(keys[1].name(), "Anno 1800");
        assert_eq!(keys[2].name(), "635");

        assert_eq!(keys[1].values.len(), 2);
        assert_eq!(
            keys[1].get_value(&["installdir"]).map(|v| v.data.as_str()),
            Some("C:\\Games\\Anno 1800")
        );
        assert!(keys[0].get_value(&["installdir"]).is_none());
    }

    #[test]
    fn test_get_value_ignores_case_and_spaces_and_prefers_latest() {
        let keys = parse_registry_dump(
            "HKEY_LOCAL_MACHINE\\SOFTWARE\\EA Games\\Battlefield 2042
    Install Dir    REG_SZ    C:\\Old
    INSTALLDIR    REG_SZ    D:\\EA Games\\Battlefield 2042
",
        );

        assert_eq!(
            keys[0].get_value(&["installdir"]).map(|v| v.data.as_str()),
            Some("D:\\EA Games\\Battlefield 2042")
        );
    }

    #[test]
    fn test_parse_registry_dump_without_keys() {
        let dump = "    InstallDir    REG_SZ    C:\\Games\nERROR: Access is denied.\n";
        assert!(parse_registry_dump(dump).is_empty());
        assert!(parse_registry_dump("").is_empty());
    }

    #[test]
    fn test_static_registry() {
        let registry = StaticRegistry::new().with_dump("HKEY_LOCAL_MACHINE\\SOFTWARE\\Test", "x");

        assert_eq!(
            registry.query_tree("hkey_local_machine\\software\\test").ok(),
            Some("x".to_owned())
        );
        assert!(
            registry
                .query_value("HKEY_LOCAL_MACHINE\\SOFTWARE\\Other", "Value")
                .is_err_and(|e| e.kind() == io::ErrorKind::NotFound)
        );
    }
}
