pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, RenderArgs, ShowArgs};
pub use output::{OutputFormat, OutputFormatter};
