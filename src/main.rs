use clap::Parser;
use oiwatch::cli::{handle_completions, handle_config_init, Cli, Commands, ConfigCommands};
use oiwatch::orchestrator::OverallStatus;

/// Exit code of `oiwatch snapshot` when no source could be reached.
const EXIT_UNREACHABLE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => oiwatch::cli::serve::run_serve(args).await,
        Commands::Snapshot(args) => match oiwatch::cli::snapshot::run_snapshot(args).await {
            Ok(OverallStatus::Unreachable) => std::process::exit(EXIT_UNREACHABLE),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        },
        Commands::Sources(args) => {
            oiwatch::cli::sources::handle_sources(&args).map(|output| println!("{}", output))
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
