mod args;
mod download;

use anyhow::Result;
use clap::Parser;
use satsearch_core::{Scene, Search, SearchConfig, snapshot};
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the --verbosity default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.verbosity.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.api_url = url.clone();
    }
    if let Some(datadir) = &cli.datadir {
        config.datadir = datadir.clone();
    }
    if let Some(subdirs) = &cli.subdirs {
        config.subdirs = subdirs.clone();
    }
    if let Some(filename) = &cli.filename {
        config.filename = filename.clone();
    }
    if let Some(limit) = cli.limit {
        config.limit = limit;
    }

    let search = match &cli.load {
        Some(path) => Search::load(&config, path).await?,
        None => Search::new(&config, args::criteria_from_args(&cli)?)?,
    };

    if cli.printsearch {
        for (i, query) in search.queries().iter().enumerate() {
            println!("Query {}: {:?}", i + 1, query.params());
        }
    }

    let scenes = search.scenes().await?;
    println!("Found {} scenes", scenes.len());
    print_scenes(&scenes, &cli.printmd);

    if let Some(path) = &cli.save {
        snapshot::save_scenes(path, &scenes, cli.append).await?;
    }

    if !cli.download.is_empty() {
        download::download_assets(&config, &scenes, &cli.download).await?;
    }

    Ok(())
}

fn print_scenes(scenes: &[Scene], keys: &[String]) {
    for scene in scenes {
        if keys.is_empty() {
            println!(
                "{}  {}  {}",
                scene.scene_id(),
                scene.string_value("date").unwrap_or("-"),
                scene.satellite_name().unwrap_or("-"),
            );
        } else {
            let values: Vec<String> = keys
                .iter()
                .map(|k| scene.metadata_string(k).unwrap_or_else(|| "-".to_string()))
                .collect();
            println!("{}", values.join("  "));
        }
    }
}
