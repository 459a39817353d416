use crate::config::parse_provider;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// LLM-assisted citation context analysis for LaTeX paper sources
#[derive(Parser, Debug)]
#[command(
    name = "citetrace",
    about = "LLM-assisted citation context analysis for LaTeX paper sources",
    version,
    author,
    long_about = "citetrace assembles a multi-file LaTeX paper, resolves its bibliography \
                  and asks a language model where and how each reference is cited. \
                  Responses are cached on disk so repeated runs are cheap."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze the citations of a LaTeX paper",
        long_about = "Extracts the paper (if archived), assembles its sources, resolves the \
                      bibliography and analyzes every entry concurrently.\n\n\
                      Examples:\n  \
                      citetrace analyze\n  \
                      citetrace analyze paper.tar.gz -o report.html\n  \
                      citetrace analyze ./paper --format json\n  \
                      citetrace analyze -b ollama -m qwen2.5:7b --concurrency 4"
    )]
    Analyze(AnalyzeArgs),

    #[command(about = "Manage the response cache")]
    Cache(CacheArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "INPUT",
        default_value = "latex_source.gz",
        help = "Paper directory or archive (.tar, .tar.gz, .tgz, .gz)"
    )]
    pub input: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Report path (defaults to references_analysis_report.<format>)"
    )]
    pub output: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "html", help = "Report format")]
    pub format: OutputFormatArg,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "./data",
        help = "Directory archives are extracted into"
    )]
    pub work_dir: PathBuf,

    #[arg(long, help = "Disable the response cache")]
    pub no_cache: bool,

    #[arg(long, value_name = "DIR", help = "Cache directory")]
    pub cache_dir: Option<PathBuf>,

    #[arg(
        short = 'b',
        long,
        value_parser = parse_adapter_kind,
        help = "Analysis service provider (deepseek, openai, claude, gemini, groq, ollama)"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Model name to use")]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "N", help = "Maximum concurrent service requests")]
    pub concurrency: Option<usize>,
}

impl AnalyzeArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "references_analysis_report.{}",
                OutputFormat::from(self.format).extension()
            ))
        })
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheCommand {
    #[command(about = "Delete every cached response")]
    Clear {
        #[arg(long, value_name = "DIR", help = "Cache directory")]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Html,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Html => OutputFormat::Html,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|_| {
        format!(
            "Invalid provider: {}. Valid options: deepseek, openai, claude, gemini, groq, ollama",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_analyze_args() {
        let args = CliArgs::parse_from(["citetrace", "analyze"]);
        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.input, PathBuf::from("latex_source.gz"));
                assert_eq!(analyze.format, OutputFormatArg::Html);
                assert_eq!(analyze.work_dir, PathBuf::from("./data"));
                assert!(analyze.backend.is_none());
                assert!(analyze.timeout.is_none());
                assert!(!analyze.no_cache);
                assert_eq!(
                    analyze.output_path(),
                    PathBuf::from("references_analysis_report.html")
                );
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_options() {
        let args = CliArgs::parse_from([
            "citetrace",
            "analyze",
            "paper.tgz",
            "-f",
            "json",
            "--backend",
            "ollama",
            "--model",
            "qwen2.5:14b",
            "--timeout",
            "120",
            "--concurrency",
            "4",
            "--no-cache",
        ]);

        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.input, PathBuf::from("paper.tgz"));
                assert_eq!(analyze.format, OutputFormatArg::Json);
                assert_eq!(analyze.backend, Some(AdapterKind::Ollama));
                assert_eq!(analyze.model.as_deref(), Some("qwen2.5:14b"));
                assert_eq!(analyze.timeout, Some(120));
                assert_eq!(analyze.concurrency, Some(4));
                assert!(analyze.no_cache);
                assert_eq!(
                    analyze.output_path(),
                    PathBuf::from("references_analysis_report.json")
                );
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cache_clear() {
        let args = CliArgs::parse_from(["citetrace", "cache", "clear", "--cache-dir", "/tmp/c"]);
        match args.command {
            Commands::Cache(CacheArgs {
                command: CacheCommand::Clear { cache_dir },
            }) => assert_eq!(cache_dir, Some(PathBuf::from("/tmp/c"))),
            _ => panic!("Expected Cache command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["citetrace", "-v", "analyze"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["citetrace", "--log-level", "debug", "analyze"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        assert!(CliArgs::try_parse_from(["citetrace", "-v", "-q", "analyze"]).is_err());
    }

    #[test]
    fn test_adapter_kind_parsing() {
        assert_eq!(parse_adapter_kind("claude"), Ok(AdapterKind::Anthropic));
        assert_eq!(parse_adapter_kind("DeepSeek"), Ok(AdapterKind::DeepSeek));
        assert!(parse_adapter_kind("invalid").is_err());
    }
}
