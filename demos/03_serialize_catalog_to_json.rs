use std::io::{Write, stdout};

use lib_game_aggregator::get_detector;

fn main() {
    let catalog = get_detector().scan_all();

    if catalog.games().next().is_none() {
        println!("No games detected.")
    } else {
        let serialized =
            serde_json::to_string_pretty(&catalog).expect("failed to serialize catalog");
        let mut stdout = stdout().lock();
        writeln!(&mut stdout, "{serialized}").expect("failed to write to stdout");
    }
}
