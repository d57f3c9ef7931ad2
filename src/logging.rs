//! Global logger setup.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger; subsequent calls are ignored.
///
/// Honors the `RUST_LOG` filter syntax when set and defaults to info-level
/// output otherwise. Intended usage is early in `run`.
pub(crate) fn init() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.init();

        log::debug!("logging initialized");
    });
}
