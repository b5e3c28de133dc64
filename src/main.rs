use finsight::cli::commands::{CliArgs, Commands};
use finsight::cli::handlers::{
    handle_ask, handle_config, handle_doctor, handle_health, handle_search, handle_stages,
};
use finsight::pipeline::Stage;
use finsight::util::{init_logging, LoggingConfig};
use finsight::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("finsight v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(stage_args) => handle_stages(&Stage::ALL, stage_args, args.quiet).await,
        Commands::Tidy(stage_args) => handle_stages(&[Stage::Tidy], stage_args, args.quiet).await,
        Commands::Materialize(stage_args) => {
            handle_stages(&[Stage::Materialize], stage_args, args.quiet).await
        }
        Commands::Index(stage_args) => {
            handle_stages(&[Stage::Index], stage_args, args.quiet).await
        }
        Commands::Search(search_args) => handle_search(search_args).await,
        Commands::Ask(ask_args) => handle_ask(ask_args).await,
        Commands::Doctor(doctor_args) => handle_doctor(doctor_args).await,
        Commands::Health(health_args) => handle_health(health_args).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    init_logging(LoggingConfig::from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        args.log_json,
    ));
}
