//! Shim binary that calls into the `dispatcher` library's `inner_main`.
use clap::Parser as _;
use eyre::Result;
use tele_rpi_bot_dispatcher::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Delegate to library entrypoint
    tele_rpi_bot_dispatcher::inner_main(Cli::parse()).await
}
