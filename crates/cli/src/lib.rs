pub mod commands;
pub mod logging;
pub mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roster_core::config::{AppConfig, ConfigOverrides, LlmProvider, LoadOptions};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    about = "Ask natural-language questions about a people dataset",
    long_about = "Answer questions about a JSON people dataset by letting a language model call a \
                  deterministic search tool. Runs an interactive session by default.",
    after_help = "Examples:\n  roster\n  roster ask \"who is under 30?\"\n  roster query '{queryType: [\"name\"], nameQuery: \"ali\"}'\n  roster config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a roster.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Path to the people dataset JSON file")]
    dataset: Option<PathBuf>,
    #[arg(long, global = true, help = "Model name to request from the provider")]
    model: Option<String>,
    #[arg(long, global = true, value_parser = parse_provider, help = "Model provider (openai|ollama)")]
    provider: Option<LlmProvider>,
    #[arg(long, global = true, help = "OpenAI-compatible base URL")]
    base_url: Option<String>,
    #[arg(long, global = true, help = "Log at debug level, including transcripts")]
    debug: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive question/answer session (default)")]
    Chat,
    #[command(about = "Answer a single question and exit")]
    Ask { question: String },
    #[command(about = "Run raw tool arguments through repair and search without a model")]
    Query {
        #[arg(help = "Tool arguments, possibly malformed JSON")]
        arguments: String,
        #[arg(long, help = "Tool name to dispatch (defaults to search_dataset)")]
        tool: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                dataset_path: self.dataset.clone(),
                log_level: self.debug.then(|| "debug".to_string()),
                llm_provider: self.provider,
                llm_model: self.model.clone(),
                llm_base_url: self.base_url.clone(),
            },
        }
    }
}

fn parse_provider(value: &str) -> Result<LlmProvider, String> {
    value.parse::<LlmProvider>().map_err(|error| error.to_string())
}

pub async fn run() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let result = execute(cli).await;

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

async fn execute(cli: Cli) -> CommandResult {
    let options = cli.load_options();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Config => CommandResult::text(0, commands::config::run(&options)),
        Command::Chat => match prepare("chat", options, cli.debug) {
            Ok(config) => commands::chat::run(&config).await,
            Err(failure) => failure,
        },
        Command::Ask { question } => match prepare("ask", options, cli.debug) {
            Ok(config) => commands::ask::run(&config, &question).await,
            Err(failure) => failure,
        },
        Command::Query { arguments, tool } => match prepare("query", options, cli.debug) {
            Ok(config) => commands::query::run(&config, tool.as_deref(), &arguments),
            Err(failure) => failure,
        },
    }
}

fn prepare(command: &str, options: LoadOptions, debug: bool) -> Result<AppConfig, CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), 2)
    })?;
    logging::init_logging(&config.logging, debug);
    Ok(config)
}
