//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// DORA Register of Information compiler
#[derive(Parser, Debug)]
#[command(name = "roi")]
#[command(version, about, long_about = None)]
#[command(author = "DORA RoI Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "roi.toml", env = "ROI_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "ROI_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile, validate and package the register
    Compile(commands::compile::CompileArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the build order, build waves and rule catalog
    Plan(commands::plan::PlanArgs),

    /// Verify a written package against its manifest
    Verify(commands::verify::VerifyArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Runs the selected command and returns the process exit code
    pub async fn execute(&self) -> anyhow::Result<i32> {
        match &self.command {
            Commands::Compile(args) => args.execute(&self.config).await,
            Commands::ValidateConfig(args) => args.execute(&self.config).await,
            Commands::Plan(args) => args.execute().await,
            Commands::Verify(args) => args.execute().await,
            Commands::Init(args) => args.execute().await,
        }
    }
}
