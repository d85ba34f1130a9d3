use anyhow::Result;
use clap::Parser;
use geodata_bootstrap::{
    CommonArgs, RepoArgs, init_tracing, load_config_file, resolve_release_config,
};
use geodata_core::{ReleaseUploader, SystemRunner};

#[derive(Debug, Parser)]
#[command(
    name = "geodata-release-upload",
    about = "Upload regenerated data files to the GitHub release (replaces existing assets)"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    repo: RepoArgs,

    /// Release tag to upload to (defaults to v1.0.0)
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.common.verbose);
    if let Err(err) = run(&cli) {
        tracing::error!(error = %format!("{err:#}"), "release upload failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file = load_config_file(cli.common.config.as_deref())?;
    let mut config = resolve_release_config(&cli.common, &cli.repo, &file);
    if let Some(tag) = &cli.tag {
        config.tag = tag.clone();
    }
    let uploader = ReleaseUploader::new(SystemRunner, config);
    uploader.upload()?;
    println!("upload complete");
    for url in uploader.download_urls() {
        println!("  {url}");
    }
    Ok(())
}
