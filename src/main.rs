use citetrace::cli::commands::{CliArgs, Commands};
use citetrace::cli::handlers::{handle_analyze, handle_cache};
use citetrace::util::init_with_level;
use citetrace::VERSION;

use clap::Parser;
use std::env;
use tracing::debug;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("citetrace v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, args.quiet).await,
        Commands::Cache(cache_args) => handle_cache(cache_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level) = &args.log_level {
        level.clone()
    } else if args.verbose {
        "debug".to_string()
    } else if args.quiet {
        "error".to_string()
    } else {
        env::var("CITETRACE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };

    init_with_level(&level);
}
