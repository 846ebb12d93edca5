use clap::Parser;

use seafuse_server::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    log::debug!("Starting with {:?}", cli);

    if cli.feed.is_none() && cli.simulate.is_none() && cli.klv.is_empty() {
        log::warn!("No --feed, --simulate or --klv input given, nothing to do");
    }

    tokio::select! {
        result = seafuse_server::run(cli) => {
            let summary = result?;
            log::debug!("{:?}", summary);
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
        },
    }
    Ok(())
}
