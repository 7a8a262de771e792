//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Crates whose level follows the `-v` flag.
const CRATES: &[&str] = &[
    "geoport",
    "geoport_lib",
    "geoport_fetch",
    "geoport_format",
    "geoport_jobs",
];

/// Maps the `-v` count onto a level name.
const fn level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn default_directives(verbose: u8) -> String {
    let level = level(verbose);
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the `-v` count when set.
pub(crate) fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init();
}
