use anyhow::Result;
use clap::Parser;
use geodata_bootstrap::{
    CommonArgs, FetchArgs, init_tracing, load_config_file, resolve_fetch_config,
};
use geodata_core::BootstrapFetcher;

#[derive(Debug, Parser)]
#[command(
    name = "geodata-fetch",
    about = "Download the GSA parcel data and stage it in a local data directory",
    long_about = "Quick start: geodata-fetch\n\nWith no flags the parcel archive is downloaded into ./data and extracted in place. Use --preset downloaded-data-gpkg to also fetch merged_geodata.gpkg into ./downloaded_data."
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    fetch: FetchArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.common.verbose);
    if let Err(err) = run(&cli) {
        tracing::error!(error = %format!("{err:#}"), "fetch failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file = load_config_file(cli.common.config.as_deref())?;
    let config = resolve_fetch_config(&cli.common, &cli.fetch, &file)?;
    let report = BootstrapFetcher::new(config)?.run()?;
    println!("{}", report.completion_message());
    Ok(())
}
