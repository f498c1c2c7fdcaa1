//! User data laid over a finished scan: accumulated play time and cover image overrides, both
//! keyed by game ID.
use std::{collections::HashMap, fs::read_to_string, path::Path};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    data::{Catalog, Game},
    error::GamesParsingError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlays {
    play_time_minutes: HashMap<String, u64>,
    cover_urls: HashMap<String, String>,
}

/// Reads a JSON object from disk. A missing file is an empty object.
fn read_json_object(path: &Path) -> Result<serde_json::Map<String, Value>, GamesParsingError> {
    if !path.is_file() {
        debug!("No overlay file at {path:?}");
        return Ok(Default::default());
    }

    match serde_json::from_str::<Value>(&read_to_string(path)?)? {
        Value::Object(map) => Ok(map),
        other => Err(GamesParsingError::Other(format!(
            "expected an object in {path:?}, found {other}"
        ))),
    }
}

impl Overlays {
    /// Loads both overlay files. Unreadable files are logged and treated as empty.
    pub fn load(path_play_stats: &Path, path_cover_overrides: &Path) -> Self {
        let play_stats = read_json_object(path_play_stats).unwrap_or_else(|e| {
            warn!("Ignoring play statistics at {path_play_stats:?}: {e}");
            Default::default()
        });
        let covers = read_json_object(path_cover_overrides).unwrap_or_else(|e| {
            warn!("Ignoring cover overrides at {path_cover_overrides:?}: {e}");
            Default::default()
        });

        Self {
            play_time_minutes: play_stats
                .into_iter()
                .filter_map(|(id, minutes)| Some((id, minutes.as_u64()?)))
                .collect(),
            // Empty overrides mean "no override"
            cover_urls: covers
                .into_iter()
                .filter_map(|(id, url)| {
                    let url = url.as_str()?.trim();
                    (!url.is_empty()).then(|| (id, url.to_owned()))
                })
                .collect(),
        }
    }

    pub fn with_play_time(mut self, id: impl Into<String>, minutes: u64) -> Self {
        self.play_time_minutes.insert(id.into(), minutes);
        self
    }

    pub fn with_cover(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.cover_urls.insert(id.into(), url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.play_time_minutes.is_empty() && self.cover_urls.is_empty()
    }

    pub(crate) fn apply(&self, mut game: Game) -> Game {
        if let Some(minutes) = self.play_time_minutes.get(&game.id) {
            game.play_time_minutes = *minutes;
        }
        if let Some(url) = self.cover_urls.get(&game.id) {
            game.cover_url = Some(url.clone());
        }
        game
    }
}

impl Catalog {
    /// Returns this catalog with play time and cover overrides filled in
    pub fn with_overlays(self, overlays: &Overlays) -> Self {
        if overlays.is_empty() {
            return self;
        }
        self.map_games(|game| overlays.apply(game))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::write, path::PathBuf};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::{LaunchTarget, Platform};

    fn get_game(id: &str) -> Game {
        Game::new(
            id,
            id,
            Platform::Custom,
            "/games",
            LaunchTarget::Executable(PathBuf::from("/games/game.exe")),
        )
    }

    #[test]
    fn test_load_overlays() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let path_stats = dir.path().join("play-stats.json");
        let path_covers = dir.path().join("custom-covers.json");
        write(&path_stats, r#"{ "steam_730": 125, "epic_Fortnite": "bad" }"#)?;
        write(
            &path_covers,
            r#"{ "steam_730": "https://example.com/cs2.png", "epic_Fortnite": "" }"#,
        )?;

        let overlays = Overlays::load(&path_stats, &path_covers);
        assert_eq!(
            overlays,
            Overlays::default()
                .with_play_time("steam_730", 125)
                .with_cover("steam_730", "https://example.com/cs2.png")
        );

        let game = overlays.apply(get_game("steam_730"));
        assert_eq!(game.play_time_minutes, 125);
        assert_eq!(game.cover_url.as_deref(), Some("https://example.com/cs2.png"));

        let untouched = overlays.apply(get_game("epic_Fortnite"));
        assert_eq!(untouched, get_game("epic_Fortnite"));

        Ok(())
    }

    #[test]
    fn test_broken_or_missing_files_are_empty() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let path_stats = dir.path().join("play-stats.json");
        write(&path_stats, "[1, 2, 3]")?;

        let overlays = Overlays::load(&path_stats, &dir.path().join("missing.json"));
        assert!(overlays.is_empty());

        Ok(())
    }

    #[test]
    fn test_catalog_with_overlays() {
        let catalog = Catalog::new(
            vec![(Platform::Custom, vec![get_game("custom_a"), get_game("custom_b")])],
            Vec::new(),
        )
        .with_overlays(&Overlays::default().with_play_time("custom_b", 10));

        let minutes: Vec<_> = catalog.games().map(|g| g.play_time_minutes).collect();
        assert_eq!(minutes, [0, 10]);
    }
}
