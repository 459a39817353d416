//! Utility modules for citetrace

pub mod logging;
pub mod nullable;

pub use logging::{init_default, init_from_env, init_logging, init_with_level, LoggingConfig};
pub use nullable::deserialize_null_default;
