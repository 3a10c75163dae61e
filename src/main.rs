use std::sync::Arc;

use clap::{Parser, Subcommand};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use weather_assistant::{bot, config, terminal, Config, Orchestrator};

#[derive(Parser)]
#[command(name = "weather-assistant")]
#[command(author, version, about = "Ask a Gemini model about the weather", long_about = None)]
struct Cli {
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Gemini model to use instead of GEMINI_MODEL.
  #[arg(long, global = true)]
  model: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Serve the assistant as a Telegram bot (needs TELOXIDE_TOKEN).
  Bot,
  /// Chat with the assistant in this terminal.
  Chat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  let level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  let token = match cli.command {
    Commands::Bot => Some(config::bot_token()?),
    Commands::Chat => None,
  };
  let config = Config::from_env()?.with_model(cli.model.as_deref());
  let assistant = Orchestrator::new(config.gemini_client()?, config.toolbox()?);
  info!(model = %String::from(config.model.clone()), "assistant ready");

  match token {
    Some(token) => bot::run(Bot::new(token), Arc::new(assistant)).await,
    None => terminal::run(&assistant).await?,
  }

  Ok(())
}
