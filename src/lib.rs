//! A Rust library for discovering games installed through multiple storefronts and publisher
//! launchers on a Windows machine.
//!
//! # Description
//!
//! This library is intended for programs which need a unified view of the games installed on a
//! system, such as a games launcher or a library manager. Each supported platform has its own
//! scanner; the detector runs all of them and collects the results into a [`data::Catalog`] with
//! one bucket per platform, where every game carries its install directory and a
//! [`data::LaunchTarget`] describing how to start it.
//!
//! Platforms with a reliable install manifest (Steam, Epic Games Store, Riot Games) are read from
//! it. The others (EA, Ubisoft Connect, Rockstar Games, Xbox) are found by searching the usual
//! install folders on every drive, picking the most likely executable in each candidate folder,
//! and skipping folders which actually belong to a Steam install.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lib_game_aggregator::{data::{GamesDetector, Platform}, get_detector};
//!
//! let detector = get_detector();
//! let catalog = detector.scan_all();
//! let steam_games = catalog.get(Platform::Steam);
//! let all_games = detector.get_all_detected_games();
//! let all_games_by_platform = detector.get_all_detected_games_per_platform();
//! let all_games_from_ea = detector.get_all_detected_games_from_specific_platform(Platform::Ea);
//! ```
//!
//! For scans against recorded data, build a [`detector::Detector`] with
//! [`detector::Detector::with_sources`] and the in-memory
//! [`system::registry::StaticRegistry`] and [`system::drives::FixedDrives`].
//!
//! # Currently supported game sources
//!
//! - Steam
//! - Epic Games Store
//! - Rockstar Games (known titles only)
//! - Riot Games (League of Legends, VALORANT, Legends of Runeterra)
//! - EA app / Origin
//! - Ubisoft Connect
//! - Xbox app / PC Game Pass
//! - Games added by hand, read from a JSON file

pub mod config;
pub mod data;
pub mod detector;
pub mod error;
pub mod heuristics;
mod macros;
pub mod overlays;
mod parsers;
pub mod scanners;
pub mod system;
mod utils;

use config::ScanConfig;
use data::GamesDetector;
use detector::Detector;

/// Primary entry point into the crate - get a [`GamesDetector`] configured from the environment
pub fn get_detector() -> Box<dyn GamesDetector> {
    Box::new(Detector::new(&ScanConfig::from_env()))
}
