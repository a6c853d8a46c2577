use anyhow::Result;
use clap::Parser;
use money_spender::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    money_spender::init_tracing(cli.verbose);
    cli.run().await
}
