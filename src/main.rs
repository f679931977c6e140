//! reviewlens CLI entry point.

use clap::Parser;
use reviewlens::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "reviewlens=debug",
        _ => "reviewlens=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    if let Commands::Init(args) = &cli.command {
        return cli::run_init(args);
    }

    let config = cli::load_config(cli.config.as_deref())?;
    match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args, &config),
        Commands::Review(args) => cli::run_review(args, &config),
        Commands::Prompt(args) => cli::run_prompt(args, &config),
        Commands::Init(args) => cli::run_init(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
