//! Command-line options and their normalization into typed criteria.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use satsearch_core::Criteria;

#[derive(Parser, Debug)]
#[command(
    name = "sat-search",
    about = "Search a satellite imagery catalog and download assets",
    version
)]
pub struct Cli {
    // search parameters
    /// Name of satellite
    #[arg(long)]
    pub satellite_name: Option<String>,

    /// One or more scene IDs
    #[arg(long = "scene-id", num_args = 1..)]
    pub scene_id: Vec<String>,

    /// GeoJSON geometry (inline string or path to a file)
    #[arg(long)]
    pub intersects: Option<String>,

    /// lon,lat point the scene must contain
    #[arg(long)]
    pub contains: Option<String>,

    /// Single date or comma separated begin,end dates
    #[arg(long)]
    pub date: Option<String>,

    /// Range of acceptable cloud cover, e.g. 0,20
    #[arg(long)]
    pub clouds: Option<String>,

    /// Additional filter parameters of form KEY=VALUE
    #[arg(long = "param", num_args = 1.., value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// URL of the API
    #[arg(long)]
    pub url: Option<String>,

    /// Page size requested from the API
    #[arg(long)]
    pub limit: Option<usize>,

    // saving/loading
    /// Load search results from file (ignores other search parameters)
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Save scene metadata as GeoJSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Append scenes to the save file instead of overwriting
    #[arg(long)]
    pub append: bool,

    // download
    /// Local directory to save images
    #[arg(long)]
    pub datadir: Option<String>,

    /// Save in subdirs based on these metadata keys
    #[arg(long)]
    pub subdirs: Option<String>,

    /// Save files with this filename pattern based on metadata keys
    #[arg(long)]
    pub filename: Option<String>,

    /// Download the named assets for every matched scene
    #[arg(long, num_args = 1..)]
    pub download: Vec<String>,

    // output
    /// Print the effective search parameters
    #[arg(long)]
    pub printsearch: bool,

    /// Print the given metadata keys for every matched scene
    #[arg(long, num_args = 1..)]
    pub printmd: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    pub verbosity: String,
}

/// Split a `--date` value into a from/to pair. A single date covers
/// exactly that day.
pub fn split_date_range(raw: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [single] => Ok((single.to_string(), single.to_string())),
        [from, to] => Ok((from.to_string(), to.to_string())),
        _ => bail!("provide a single date or comma separated begin,end dates: {raw}"),
    }
}

/// Split a `--clouds` value into a numeric from/to pair.
pub fn split_cloud_range(raw: &str) -> Result<(i64, i64)> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [from, to] = parts.as_slice() else {
        bail!("provide cloud coverage as two comma separated numbers (e.g. 0,20): {raw}");
    };
    let from = from
        .parse::<i64>()
        .with_context(|| format!("cloud coverage is not a number: {from}"))?;
    let to = to
        .parse::<i64>()
        .with_context(|| format!("cloud coverage is not a number: {to}"))?;
    Ok((from, to))
}

/// Split one `--param` argument into a key/value pair.
pub fn parse_key_value(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("parameter is not of form KEY=VALUE: {raw}"),
    }
}

/// Resolve `--intersects` to inline GeoJSON, reading it from disk when
/// the value names an existing file.
pub fn resolve_intersects(raw: &str) -> Result<String> {
    if std::path::Path::new(raw).is_file() {
        return std::fs::read_to_string(raw)
            .with_context(|| format!("failed to read geometry file {raw}"));
    }
    Ok(raw.to_string())
}

/// Build typed search criteria out of the raw command-line options.
pub fn criteria_from_args(cli: &Cli) -> Result<Criteria> {
    let mut criteria = Criteria {
        satellite_name: cli.satellite_name.clone(),
        contains: cli.contains.clone(),
        scene_ids: cli.scene_id.clone(),
        ..Default::default()
    };
    if let Some(date) = &cli.date {
        let (from, to) = split_date_range(date)?;
        criteria.date_from = Some(from);
        criteria.date_to = Some(to);
    }
    if let Some(clouds) = &cli.clouds {
        let (from, to) = split_cloud_range(clouds)?;
        criteria.cloud_from = Some(from);
        criteria.cloud_to = Some(to);
    }
    if let Some(geom) = &cli.intersects {
        criteria.intersects = Some(resolve_intersects(geom)?);
    }
    let mut params = BTreeMap::new();
    for raw in &cli.params {
        let (key, value) = parse_key_value(raw)?;
        params.insert(key, value);
    }
    criteria.params = params;
    Ok(criteria)
}
