//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default directives when `RUST_LOG` is not set.
fn default_directives(level: &str) -> String {
    format!("warn,utils={level},domain={level},services={level},console={level}")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when present. Calling this twice is harmless: the
/// second registration fails silently and the first subscriber stays active.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("services=debug"));
        assert!(directives.contains("console=debug"));
    }
}
