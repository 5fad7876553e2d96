//! Log sink setup for the `monkaos` binary.

use crate::error::{MonkeyError, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Parse a verbosity name.
///
/// Accepts the standard `tracing` levels plus `warning`, and maps `fatal`
/// and `panic` onto `error`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        other => Err(MonkeyError::InvalidConfig {
            reason: format!("unknown log level: {other}"),
        }),
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(level)?.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| MonkeyError::InvalidConfig {
            reason: format!("failed to install log subscriber: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_levels_parse() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn fatal_and_panic_map_to_error() {
        assert_eq!(parse_level("fatal").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("panic").unwrap(), LevelFilter::ERROR);
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(matches!(
            parse_level("loud"),
            Err(MonkeyError::InvalidConfig { .. })
        ));
    }
}
