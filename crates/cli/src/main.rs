//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `chat`      Talk to a persona, interactively or with a single message
//! - `personas`  List the built-in personas
//! - `config`    Manage the configuration file

use clap::{Parser, Subcommand, ValueEnum};
use parley_agent::Persona;

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — conversational agents with retrieval and exit detection",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a persona
    Chat {
        /// Which persona to talk to
        #[arg(short, long, value_enum, default_value_t = PersonaArg::Muse)]
        persona: PersonaArg,

        /// Session identifier the transcript is kept under
        #[arg(short, long, default_value = "default-user")]
        session: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the built-in personas
    Personas,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum PersonaArg {
    /// Creative-writing partner with book search
    Muse,
    /// Georgian-speaking pizza cashier
    Gino,
}

impl PersonaArg {
    fn persona(self) -> Persona {
        match self {
            PersonaArg::Muse => Persona::muse(),
            PersonaArg::Gino => Persona::gino(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the conversation
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat {
            persona,
            session,
            message,
        } => commands::chat::run(persona.persona(), session, message).await?,
        Commands::Personas => commands::personas::run(),
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config_cmd::init()?,
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Validate => commands::config_cmd::validate()?,
        },
    }

    Ok(())
}
