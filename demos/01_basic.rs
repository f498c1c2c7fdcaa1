use lib_game_aggregator::{data::Platform, get_detector};
use tracing::debug;

fn main() {
    // Init tracing
    tracing_subscriber::fmt::init();

    debug!("Initialising detector");
    let detector = get_detector();

    dbg!(detector.get_detected_scanners());
    dbg!(detector.get_all_detected_games());
    dbg!(detector.get_all_detected_games_per_platform());
    dbg!(detector.get_all_detected_games_from_specific_platform(Platform::Steam));
}
