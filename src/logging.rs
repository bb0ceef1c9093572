//! Logger setup.
//!
//! Log records go through the `log` facade and are written by a `fern` dispatcher to stdout and,
//! optionally, to a file. Lines look like `[2024-01-01 12:00:00 INFO remus::render] message`.

use std::path::Path;

use log::LevelFilter;

/// Environment variable that overrides the configured level.
pub const LEVEL_ENV: &str = "REMUS_LOG";

/// Parses a level name, case-insensitively.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Picks the level from [`LEVEL_ENV`] if it is set and valid, else from `configured`, else
/// `info`.
pub fn resolve_level(configured: &str) -> LevelFilter {
    std::env::var(LEVEL_ENV)
        .ok()
        .and_then(|name| parse_level(&name))
        .or_else(|| parse_level(configured))
        .unwrap_or(LevelFilter::Info)
}

/// Installs the global logger. Fails if a logger is already installed or the log file cannot be
/// opened.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    log::debug!("logging initialized at {level}");
    Ok(())
}
