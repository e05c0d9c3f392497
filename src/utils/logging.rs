//! Logging initialization.
//!
//! Library code only talks to the `log` facade. Hosts that do not bring
//! their own logger can call [`init_logging`] once at startup.

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "myth_editor=info";

/// Installs `env_logger` honouring `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_FILTER);
    let _ = env_logger::Builder::from_env(env)
        .format_target(true)
        .try_init();
}
