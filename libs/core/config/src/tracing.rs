use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
///
/// Production keeps catalog operations at `info` and silences driver chatter;
/// development logs the whole request path.
pub fn default_directive(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,mongodb=warn"
    } else {
        "debug,mongodb=info"
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): JSON lines, flattened events,
///   module targets hidden.
/// - **Development** (default): pretty, human-readable output.
///
/// Both include [`tracing_error::ErrorLayer`] so errors built inside an
/// instrumented catalog operation can carry the active span trace.
/// `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place, which is what test binaries need.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(environment)));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
