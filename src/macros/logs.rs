macro_rules! debug_path {
    ($description: expr, $path: ident) => {
        tracing::debug!(
            "{PLATFORM} - {} exists at {:?}: {}",
            $description,
            $path,
            $path.exists()
        );
    };
}
pub(crate) use debug_path;

macro_rules! debug_source_unavailable {
    ($source: expr, $err: expr) => {
        tracing::debug!("{PLATFORM} - Source unavailable ({}): {}", $source, $err);
    };
}
pub(crate) use debug_source_unavailable;

macro_rules! trace_rejected {
    ($reason: expr, $name: expr, $path: expr) => {
        tracing::trace!(
            "{PLATFORM} - Skipped '{}' at {:?}: {:?}",
            $name,
            $path,
            $reason
        );
    };
}
pub(crate) use trace_rejected;

macro_rules! warn_no_games {
    () => {
        tracing::warn!("{PLATFORM} - No games found");
    };
}
pub(crate) use warn_no_games;
