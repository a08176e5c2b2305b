//! Logging setup.
//!
//! The engine logs through the `log` facade; binaries call `init_logging` once
//! early in `main` to install `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig};
