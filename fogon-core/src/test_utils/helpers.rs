// File: fogon-core/src/test_utils/helpers.rs

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a fmt subscriber for test output. Safe to call from every test;
/// only the first call wins.
pub fn init_test_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("fogon_core=debug".parse().unwrap_or_default());
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}
