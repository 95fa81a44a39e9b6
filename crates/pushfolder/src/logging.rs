//! Optional stdout logging for programs embedding the publisher.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the filter passed to [`init`].
pub const LOG_ENV: &str = "PUSHFOLDER_LOG";

/// Install a global `fmt` subscriber writing to stdout.
///
/// `default_filter` uses `EnvFilter` syntax (e.g. `"pushfolder=info"`) and is
/// replaced by [`LOG_ENV`] when that variable is set. Returns `false` if a
/// global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init()
        .is_ok()
}
