//! tfprobe -- reset, template and apply a Terraform module across a
//! provider-version matrix.
//!
//! Exit codes follow [`CliError::exit_code`].

use clap::Parser;

use tfprobe_cli::cli::{Cli, Commands};
use tfprobe_cli::commands;
use tfprobe_cli::error::CliError;
use tfprobe_cli::logging::init_tracing;
use tfprobe_cli::output::OutputWriter;
use tfprobe_core::config::TfprobeConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging must be up before the command handlers emit anything.
    // An unreadable config still gets default logging so the handler can
    // report the real error.
    let general = TfprobeConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    if let Err(e) = init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("error: {e}");
        std::process::exit(CliError::Config(e.to_string()).exit_code());
    }

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Prepare(args) => commands::prepare::execute(args, &cli.config, &writer).await,
        Commands::Reset => commands::reset::execute(&cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
