//! Utility Module
//!
//! - [`logging`]: `env_logger` setup for binaries and tests embedding the editor core

pub mod logging;

pub use logging::init_logging;
