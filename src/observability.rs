//! Logging initialization
//!
//! Installs a `tracing` subscriber writing to stderr, so that stdout stays reserved
//! for command output. The `TWIG_LOG` environment variable takes precedence over the
//! verbosity requested on the command line.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

pub const LOG_ENV_VAR: &str = "TWIG_LOG";

/// Map the number of `-v` flags to a filter directive
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_tracing(verbosity: u8) -> anyhow::Result<()> {
    let env_filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(level_for_verbosity(verbosity))?,
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .without_time()
        .compact();

    Registry::default()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Unable to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_increasing_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(7), "trace");
    }
}
