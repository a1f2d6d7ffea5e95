//! Subscriber setup for the `cbi-reports` binary.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Filter used when `CBI_LOG` is unset or does not parse.
pub const DEFAULT_FILTER: &str = "cbi_core=info,cbi_storage=info,cbi_reports=info";

/// Install the global subscriber. Later calls are no-ops.
///
/// Levels come from `CBI_LOG`, e.g. `CBI_LOG=cbi_reports=debug,cbi_storage=warn`.
/// Logs go to stderr so `plan --json` and `status --json` keep stdout clean.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = match EnvFilter::try_from_env("CBI_LOG") {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(DEFAULT_FILTER),
        };

        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
        if installed.is_err() {
            tracing::debug!("a global subscriber was already installed");
        }
    });
}
