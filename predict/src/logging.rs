use std::io;

use tracing::level_filters::LevelFilter;

/// Installs a compact subscriber on stderr. Stdout carries the JSON answer
/// only, so nothing may ever be logged there.
pub fn init(level: LevelFilter) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| format!("failed to initialize logging: {err}"))
}
