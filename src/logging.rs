//! Tracing subscriber setup for applications embedding the client.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "sessionkit=info";

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed, so calling
/// this more than once is harmless.
pub fn init() -> bool {
    init_with_filter(env_filter())
}

/// Install a fmt subscriber with an explicit filter directive.
pub fn init_with(directive: &str) -> bool {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_with_filter(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_init_is_idempotent() {
        let _first = init_with("sessionkit=debug");
        // A second install always loses against the first one
        assert!(!init());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new("sessionkit=notalevel").is_err());
    }
}
