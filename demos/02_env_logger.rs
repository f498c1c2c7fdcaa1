use is_terminal::IsTerminal;
use lib_game_aggregator::get_detector;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// NOTE: run with, e.g. `RUST_LOG=lib_game_aggregator=trace cargo run --example 02_env_logger > logs.txt`
fn main() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .without_time()
                .with_line_number(true)
                // Don't output colours for logs not being printed to a terminal
                .with_ansi(std::io::stdout().is_terminal()),
        )
        .with(EnvFilter::from_default_env())
        .init();

    let catalog = get_detector().scan_all();

    for report in catalog.reports() {
        match &report.failure {
            Some(failure) => println!("{}: failed ({failure})", report.platform),
            None => println!(
                "{}: {} games, {} candidates seen",
                report.platform, report.games_found, report.diagnostics.candidates_seen
            ),
        }
    }
}
