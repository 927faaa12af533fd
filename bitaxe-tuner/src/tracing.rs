//! Logging setup and the crate-wide logging prelude.
//!
//! Modules import `crate::tracing::prelude::*` rather than the `tracing`
//! crate directly so the set of macros in use stays uniform.

use tracing_subscriber::{EnvFilter, fmt::time::LocalTime, prelude::*};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Filter applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "bitaxe_tuner=info";

/// Install a stderr subscriber with local timestamps.
///
/// `RUST_LOG` overrides the default filter, e.g.
/// `RUST_LOG=bitaxe_tuner=debug`.
pub fn init_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(LocalTime::rfc_3339())
                .with_target(false),
        )
        .init();
}
