// Logging and verbosity control

use relief_config::AppSettings;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive from the command-line flags, falling back to the
/// `VERBOSE` setting
pub fn filter_for(verbose: bool, quiet: bool, settings: &AppSettings) -> &'static str {
    if quiet {
        "error"
    } else if verbose && settings.verbose < 3 {
        "info"
    } else {
        settings.log_level()
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `filter`.
///
/// Logs go to stderr so build output on stdout stays clean.
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    // A second init (tests) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = AppSettings::default();
        assert_eq!(filter_for(false, false, &settings), "warn");
        assert_eq!(filter_for(true, false, &settings), "info");
        assert_eq!(filter_for(true, true, &settings), "error");

        settings.verbose = 3;
        assert_eq!(filter_for(true, false, &settings), "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("warn");
        init_logging("debug");
    }
}
