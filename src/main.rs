use resolutes::cli::commands::{CliArgs, Commands};
use resolutes::cli::handlers::{handle_analyze, handle_render, handle_show};
use resolutes::config::{ConfigError, ResolutesConfig};
use resolutes::util::logging::{self, LoggingConfig};
use resolutes::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("resolutes v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    // Required cloud variables are checked before any network call
    let config = match ResolutesConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingEnv(name)) => {
            eprintln!("Missing required environment variable: {}", name);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, config).await,
        Commands::Render(render_args) => handle_render(render_args, &config).await,
        Commands::Show(show_args) => handle_show(show_args, &config).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let config = if let Some(level) = &args.log_level {
        LoggingConfig::with_level(logging::parse_level(level))
    } else if args.verbose > 0 || args.quiet {
        LoggingConfig::from_verbosity(args.verbose, args.quiet)
    } else {
        logging::config_from_env(LoggingConfig::default())
    };
    logging::init_logging(config);
}
