use anyhow::Result;
use clap::Parser;
use grantwatch::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args).await
}
