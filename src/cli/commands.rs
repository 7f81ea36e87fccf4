use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

use crate::config::parse_provider;

/// Multi-agent startup investment analysis
#[derive(Parser, Debug)]
#[command(
    name = "resolutes",
    about = "Multi-agent LLM pipeline producing structured startup investment reports",
    version,
    author,
    long_about = "resolutes runs six domain analysts (team, market, product, traction, \
                  finance, competition) over a startup's name and optional documents, \
                  then synthesizes their findings into a single investment report.\n\n\
                  GOOGLE_CLOUD_PROJECT and GOOGLE_CLOUD_LOCATION must be set."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: u8,

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
        about = "Analyze a startup and produce an investment report",
        long_about = "Runs the research stage and synthesis for one startup.\n\n\
                      Examples:\n  \
                      resolutes analyze \"Acme Robotics\"\n  \
                      resolutes analyze \"Acme Robotics\" --doc deck.pdf --doc memo.docx\n  \
                      resolutes analyze \"Acme Robotics\" --format json --pdf acme.pdf"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Render a saved report file to PDF",
        long_about = "Renders a report JSON file (or raw model output) to PDF, falling \
                      back to plain text when no font family is available.\n\n\
                      Examples:\n  \
                      resolutes render report.json -o report.pdf"
    )]
    Render(RenderArgs),

    #[command(
        about = "Show the latest stored report for a startup",
        long_about = "Loads the most recent pipeline report saved for a startup name.\n\n\
                      Examples:\n  \
                      resolutes show \"Acme Robotics\"\n  \
                      resolutes show \"Acme Robotics\" --format yaml"
    )]
    Show(ShowArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "STARTUP",
        help = "Startup name (prompted for when omitted on a terminal)"
    )]
    pub subject: Option<String>,

    #[arg(
        short = 'd',
        long = "doc",
        value_name = "FILE",
        help = "Supporting document (PDF or DOCX), up to 5"
    )]
    pub docs: Vec<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Also render the report to this file")]
    pub pdf: Option<PathBuf>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "Override the model provider (RESOLUTES_PROVIDER)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Override the analyzer model (RESOLUTES_MODEL)"
    )]
    pub model: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Whole-run timeout in seconds (RESOLUTES_PIPELINE_TIMEOUT)"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Disable web search for the competitor analyst")]
    pub no_search: bool,

    #[arg(long, help = "Do not persist the report")]
    pub no_save: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    #[arg(value_name = "FILE", help = "Report JSON or raw model output")]
    pub input: PathBuf,

    #[arg(short = 'o', long, value_name = "FILE", help = "Destination file")]
    pub output: PathBuf,

    #[arg(
        short = 's',
        long,
        value_name = "STARTUP",
        help = "Startup name used when the report has none"
    )]
    pub subject: Option<String>,

    #[arg(long, help = "Render plain text without attempting PDF")]
    pub text: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    #[arg(value_name = "STARTUP", help = "Startup name")]
    pub subject: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "FILE", help = "Also render the report to this file")]
    pub pdf: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|e| e.to_string())
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
        let args = CliArgs::parse_from(["resolutes", "analyze"]);
        match args.command {
            Commands::Analyze(analyze) => {
                assert!(analyze.subject.is_none());
                assert!(analyze.docs.is_empty());
                assert_eq!(analyze.format, OutputFormatArg::Human);
                assert!(analyze.timeout.is_none());
                assert!(!analyze.no_save);
                assert!(!analyze.no_search);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_with_options() {
        let args = CliArgs::parse_from([
            "resolutes",
            "analyze",
            "Acme Robotics",
            "--doc",
            "deck.pdf",
            "-d",
            "memo.docx",
            "--format",
            "json",
            "--pdf",
            "out.pdf",
            "--provider",
            "openai",
            "--model",
            "gpt-4o-mini",
            "--timeout",
            "300",
            "--no-save",
        ]);

        match args.command {
            Commands::Analyze(analyze) => {
                assert_eq!(analyze.subject.as_deref(), Some("Acme Robotics"));
                assert_eq!(
                    analyze.docs,
                    vec![PathBuf::from("deck.pdf"), PathBuf::from("memo.docx")]
                );
                assert_eq!(analyze.format, OutputFormatArg::Json);
                assert_eq!(analyze.pdf, Some(PathBuf::from("out.pdf")));
                assert_eq!(analyze.provider, Some(AdapterKind::OpenAI));
                assert_eq!(analyze.model.as_deref(), Some("gpt-4o-mini"));
                assert_eq!(analyze.timeout, Some(300));
                assert!(analyze.no_save);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_render_command() {
        let args = CliArgs::parse_from(["resolutes", "render", "r.json", "-o", "r.pdf", "--text"]);
        match args.command {
            Commands::Render(render) => {
                assert_eq!(render.input, PathBuf::from("r.json"));
                assert_eq!(render.output, PathBuf::from("r.pdf"));
                assert!(render.text);
                assert!(render.subject.is_none());
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_render_requires_output() {
        assert!(CliArgs::try_parse_from(["resolutes", "render", "r.json"]).is_err());
    }

    #[test]
    fn test_show_command() {
        let args = CliArgs::parse_from(["resolutes", "show", "Acme", "-f", "yaml"]);
        match args.command {
            Commands::Show(show) => {
                assert_eq!(show.subject, "Acme");
                assert_eq!(show.format, OutputFormatArg::Yaml);
            }
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["resolutes", "-vv", "analyze", "Acme"]);
        assert_eq!(args.verbose, 2);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["resolutes", "--log-level", "debug", "-q", "show", "Acme"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(CliArgs::try_parse_from(["resolutes", "-q", "-v", "show", "Acme"]).is_err());
    }

    #[test]
    fn test_adapter_kind_parsing() {
        assert!(parse_adapter_kind("gemini").is_ok());
        assert!(parse_adapter_kind("Anthropic").is_ok());
        assert!(parse_adapter_kind("invalid").is_err());
    }
}
