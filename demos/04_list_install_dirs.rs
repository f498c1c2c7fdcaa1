use lib_game_aggregator::get_detector;

fn main() {
    get_detector()
        .get_all_detected_games()
        .into_iter()
        // Protocol only custom entries have no install directory
        .map(|g| g.install_dir)
        .filter(|p| !p.as_os_str().is_empty())
        .for_each(|path| println!("{}", path.to_string_lossy()));
}
