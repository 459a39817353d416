pub mod commands;
pub mod handlers;

pub use commands::{AnalyzeArgs, CacheArgs, CacheCommand, CliArgs, Commands, OutputFormatArg};
pub use handlers::{handle_analyze, handle_cache};
