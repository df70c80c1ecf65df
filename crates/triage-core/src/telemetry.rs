//! Tracing initialisation for the triage binaries.
//!
//! Filter precedence: `JENKINS_TRIAGE_LOG`, then `RUST_LOG`, then the level
//! passed by the caller. Only the first call in a process takes effect.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "JENKINS_TRIAGE_LOG";

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber. Logs go to stderr so report output on
/// stdout stays clean; `json` switches to newline-delimited JSON.
pub fn init_tracing(json: bool, level: Level) {
    let filter = env_filter(level);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
            .ok();
    }
}
