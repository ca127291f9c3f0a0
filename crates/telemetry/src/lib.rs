//! Tracing subscriber bootstrap shared by the server and the CLI.

use libris_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, EnvFilter};

/// Build the event filter: `RUST_LOG` wins, otherwise the configured directive.
fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns `false` when one was already set,
/// which happens when tests or the CLI initialize telemetry twice.
pub fn init(settings: &TelemetrySettings) -> bool {
    let builder = fmt().with_env_filter(env_filter(settings)).with_target(true);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().flatten_event(true).try_init().is_ok(),
    };

    if installed {
        tracing::info!(
            target: "libris-telemetry",
            format = ?settings.log_format,
            filter = %settings.filter,
            "telemetry initialized"
        );
    }
    installed
}
