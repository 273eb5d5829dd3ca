//! Shared logging utilities for the detective binary.
//!
//! Logs always go to stderr; stdout is reserved for JSON results.

use crate::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when no verbosity flag is given.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Maps command-line verbosity flags to a log level.
///
/// `quiet` wins over any verbosity count.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// With neither flag set, a `LOG_LEVEL` environment variable (any
/// `EnvFilter` directive, e.g. `warn` or `detective_core=debug`) takes
/// precedence over the INFO default.
///
/// # Example
/// ```rust,no_run
/// use detective_core::logging::init_logging;
///
/// // Initialize at DEBUG level
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = if verbose == 0 && !quiet {
        EnvFilter::try_from_env(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()))
    } else {
        EnvFilter::new(level.as_str().to_ascii_lowercase())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::DetectiveError::configuration(format!(
                "Failed to initialize logging: {e}"
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Logging can only be initialized once per test process, so only the
    // level mapping is tested here.

    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::INFO),
            ((false, 1), tracing::Level::DEBUG),
            ((false, 2), tracing::Level::TRACE),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in test_cases {
            assert_eq!(
                level_for(verbose, quiet),
                expected,
                "Failed for quiet={quiet}, verbose={verbose}"
            );
        }
    }

    #[test]
    fn test_level_renders_as_filter_directive() {
        assert_eq!(level_for(1, false).as_str().to_ascii_lowercase(), "debug");
        assert_eq!(level_for(0, true).as_str().to_ascii_lowercase(), "error");
    }
}
