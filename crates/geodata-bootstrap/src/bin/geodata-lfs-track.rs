use anyhow::Result;
use clap::Parser;
use geodata_bootstrap::{CommonArgs, RepoArgs, init_tracing, load_config_file, resolve_lfs_config};
use geodata_core::lfs::STAGE_COMMIT;
use geodata_core::{LfsRegistrar, StageStatus, SystemRunner};

#[derive(Debug, Parser)]
#[command(
    name = "geodata-lfs-track",
    about = "Track the merged GeoPackage with Git LFS, commit and push",
    long_about = "Runs git lfs install, git lfs track data/merged_geodata.gpkg, stages .gitattributes and the file, commits and pushes to origin/main. Stops at the first failing step unless --keep-going is given."
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    repo: RepoArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.common.verbose);
    if let Err(err) = run(&cli) {
        tracing::error!(error = %format!("{err:#}"), "lfs registration failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file = load_config_file(cli.common.config.as_deref())?;
    let config = resolve_lfs_config(&cli.common, &cli.repo, &file);
    let path = config.path.clone();
    let remote = format!("{}/{}", config.remote, config.branch);
    let report = LfsRegistrar::new(SystemRunner, config).register()?;
    let committed = matches!(report.status_of(STAGE_COMMIT), Some(StageStatus::Done));
    if committed {
        println!("{path} is tracked with Git LFS and pushed to {remote}");
    } else {
        println!("{path} is tracked with Git LFS; nothing new to commit, pushed to {remote}");
    }
    Ok(())
}
