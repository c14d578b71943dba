//! Tracing setup.
//!
//! The subscriber is installed before the configuration file is read so that
//! config warnings reach the operator. The file's `log_level` is applied
//! afterwards through a reload handle.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Level used until the configuration file has been read.
pub const DEFAULT_LEVEL: &str = "info";

pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    /// Set when `RUST_LOG` or `--log-level` chose the filter.
    pinned: bool,
}

impl LogHandle {
    /// Switch to the level from the configuration file, unless `RUST_LOG` or
    /// `--log-level` already picked one.
    pub fn apply_config_level(&self, level: &str) -> Result<(), reload::Error> {
        if self.pinned {
            return Ok(());
        }
        self.handle.reload(EnvFilter::new(level))
    }

    pub fn current(&self) -> Option<String> {
        self.handle.with_current(|f| f.to_string()).ok()
    }
}

/// Priority: RUST_LOG > --log-level > [`DEFAULT_LEVEL`].
fn startup_filter(rust_log: Option<String>, cli_level: Option<&str>) -> (EnvFilter, bool) {
    if let Some(directives) = rust_log.filter(|v| !v.trim().is_empty()) {
        return (EnvFilter::new(directives), true);
    }
    match cli_level {
        Some(level) => (EnvFilter::new(level), true),
        None => (EnvFilter::new(DEFAULT_LEVEL), false),
    }
}

fn reloadable(filter: EnvFilter, pinned: bool) -> (reload::Layer<EnvFilter, Registry>, LogHandle) {
    let (layer, handle) = reload::Layer::new(filter);
    (layer, LogHandle { handle, pinned })
}

/// Install the global subscriber.
pub fn init(cli_level: Option<&str>) -> LogHandle {
    let (filter, pinned) = startup_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), cli_level);
    let (layer, log) = reloadable(filter, pinned);
    tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .init();
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins_over_flag() {
        let (filter, pinned) = startup_filter(Some("chalk_api=debug".into()), Some("warn"));
        assert!(pinned);
        assert_eq!(filter.to_string(), "chalk_api=debug");
    }

    #[test]
    fn test_flag_then_default() {
        let (filter, pinned) = startup_filter(None, Some("warn"));
        assert!(pinned);
        assert_eq!(filter.to_string(), "warn");

        let (filter, pinned) = startup_filter(Some("  ".into()), None);
        assert!(!pinned);
        assert_eq!(filter.to_string(), DEFAULT_LEVEL);
    }

    #[test]
    fn test_config_level_applied_after_startup() {
        let (layer, log) = reloadable(EnvFilter::new(DEFAULT_LEVEL), false);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            log.apply_config_level("debug").unwrap();
            assert_eq!(log.current().as_deref(), Some("debug"));
        });
    }

    #[test]
    fn test_pinned_filter_ignores_config_level() {
        let (layer, log) = reloadable(EnvFilter::new("warn"), true);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            log.apply_config_level("trace").unwrap();
            assert_eq!(log.current().as_deref(), Some("warn"));
        });
    }
}
