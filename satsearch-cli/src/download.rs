//! Asset download with metadata-templated target paths.
//!
//! The search core only hands out asset URIs; fetching the bytes and
//! laying files out on disk happens here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use satsearch_core::{Scene, SearchConfig};
use tracing::{info, warn};

/// Substitute `${key}` placeholders in a pattern with scene metadata.
/// Unknown keys substitute as empty strings.
pub fn template_path(pattern: &str, scene: &Scene) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                if let Some(value) = scene.metadata_string(key) {
                    out.push_str(&value);
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Target path for one asset: `datadir/subdirs/filename_asset.ext`.
pub fn local_path(config: &SearchConfig, scene: &Scene, asset: &str, url: &str) -> PathBuf {
    let mut name = template_path(&config.filename, scene);
    name.push('_');
    name.push_str(asset);
    if let Some(ext) = url_extension(url) {
        name.push('.');
        name.push_str(&ext);
    }
    Path::new(&config.datadir)
        .join(template_path(&config.subdirs, scene))
        .join(name)
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 {
        return None;
    }
    Some(ext.to_string())
}

/// Download the named assets for every scene.
///
/// Scenes without a requested asset are skipped with a warning; a
/// transfer failure aborts the run.
pub async fn download_assets(
    config: &SearchConfig,
    scenes: &[Scene],
    assets: &[String],
) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    for scene in scenes {
        for asset in assets {
            let Some(url) = scene.asset_url(asset) else {
                warn!("Scene {} has no asset named {}", scene.scene_id(), asset);
                continue;
            };
            let target = local_path(config, scene, asset, &url);
            fetch_to_file(&client, &url, &target)
                .await
                .with_context(|| format!("failed to download {asset} for {}", scene.scene_id()))?;
            info!("Downloaded {} -> {}", url, target.display());
        }
    }
    Ok(())
}

async fn fetch_to_file(client: &reqwest::Client, url: &str, target: &Path) -> Result<()> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP error {} for {}", response.status(), url);
    }
    let bytes = response.bytes().await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene() -> Scene {
        Scene::from_record(json!({
            "scene_id": "LC80120312017001LGN00",
            "satellite_name": "Landsat-8",
            "date": "2017-01-01",
            "path": "12"
        }))
        .unwrap()
    }

    #[test]
    fn test_template_substitution() {
        let rendered = template_path("${satellite_name}/${date}", &scene());
        assert_eq!(rendered, "Landsat-8/2017-01-01");
    }

    #[test]
    fn test_template_unknown_key_is_empty() {
        assert_eq!(template_path("x${nosuchkey}y", &scene()), "xy");
    }

    #[test]
    fn test_template_unterminated_placeholder_kept() {
        assert_eq!(template_path("a${date", &scene()), "a${date");
    }

    #[test]
    fn test_local_path_layout() {
        let config = SearchConfig {
            datadir: "/data".to_string(),
            ..Default::default()
        };
        let path = local_path(
            &config,
            &scene(),
            "thumbnail",
            "https://example.com/thumb.jpg",
        );
        assert_eq!(
            path,
            PathBuf::from("/data/Landsat-8/2017-01-01/LC80120312017001LGN00_thumbnail.jpg")
        );
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://x/y/z.tar.gz").as_deref(), Some("gz"));
        assert_eq!(url_extension("https://x/y/thumb.jpg?auth=1").as_deref(), Some("jpg"));
        assert_eq!(url_extension("https://x/y/index"), None);
    }
}
