use anyhow::Context;
use clap::Parser;

use vrlg::cli::{check, run, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::execute(&args)
            .await
            .with_context(|| format!("vrlg run failed ({})", args.config.display())),
        Commands::Check(args) => check::execute(&args)
            .with_context(|| format!("invalid configuration: {}", args.config.display())),
    }
}
