use clap::{CommandFactory, Parser, Subcommand};

mod clock;
mod commands;

#[derive(Parser)]
#[command(name = "control-predict", version, about = "Control & Predict CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a location's scenarios with scripted answers
    Play(commands::play::PlayArgs),
    /// Calming countdown timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Guided breathing exercise
    Breathe(commands::breathe::BreatheArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Scenario catalog inspection
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    // Logs go to stderr; stdout carries JSON events.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Breathe(args) => commands::breathe::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "control-predict", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
