use clap::{CommandFactory, Parser, Subcommand};

mod app;
mod commands;
mod notifier;

#[derive(Parser)]
#[command(name = "xmas-whisper", version, about = "Xmas Whisper advent calendar")]
struct Cli {
    /// Override the unlocked day (any integer; >25 opens all, <1 locks all)
    #[arg(long, global = true, allow_hyphen_values = true)]
    debug_day: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the 25-day grid
    Calendar {
        #[arg(long)]
        json: bool,
    },
    /// Open a day's postcard
    Open {
        day: i64,
        #[arg(long)]
        json: bool,
    },
    /// Onboarding profile
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Daily reminder notifications
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Postcards received so far
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Offline app-shell cache
    Offline {
        #[command(subcommand)]
        action: commands::offline::OfflineAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Gemini API key management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("xmas_whisper=info,xmas_whisper_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let debug_day = cli.debug_day;
    let result = match cli.command {
        Commands::Calendar { json } => commands::calendar::show(debug_day, json),
        Commands::Open { day, json } => commands::calendar::open(debug_day, day, json),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Offline { action } => commands::offline::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "xmas-whisper", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
