//! Logging setup shared by service binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Install the global subscriber for `crate_name` (module name, underscores).
///
/// `RUST_LOG` wins when set and valid; otherwise `log.level` applies to the
/// crate and the HTTP trace layer. `log.json` switches to JSON lines.
pub fn init_tracing(crate_name: &str, log: &LogConfig) {
    let filter = env_filter(crate_name, &log.level, std::env::var("RUST_LOG").ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn env_filter(crate_name: &str, level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter(crate_name, level)))
}

/// Filter directive giving `crate_name` and `tower_http` the same level.
pub fn default_filter(crate_name: &str, level: &str) -> String {
    format!("{crate_name}={level},tower_http={level}")
}
