use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "glycolog-cli", version, about = "Glycolog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Glycemia readings
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Reading statistics
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Log in to the backend
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account, then log in
    Register(commands::account::RegisterArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Log { action } => commands::log::run(action).await,
        Commands::Stats { json } => commands::stats::run(json).await,
        Commands::Login { email, password } => commands::account::login(&email, &password).await,
        Commands::Register(args) => commands::account::register(args).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
