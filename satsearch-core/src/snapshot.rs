//! Saving and loading scene collections as GeoJSON files.
//!
//! A snapshot is a FeatureCollection where each feature's `properties`
//! holds the raw catalog record and `geometry` the record's footprint.
//! Loading also accepts a bare array of records.

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value, json};
use tokio::fs;

use crate::error::SatSearchError;
use crate::scene::Scene;

/// Write scenes to `path`. With `append`, scenes already in the file are
/// kept and incoming duplicates (by `scene_id`) are dropped.
pub async fn save_scenes(
    path: &Path,
    scenes: &[Scene],
    append: bool,
) -> Result<(), SatSearchError> {
    let mut records: Vec<Map<String, Value>> = if append && path.exists() {
        load_scenes(path)
            .await?
            .into_iter()
            .map(Scene::into_record)
            .collect()
    } else {
        Vec::new()
    };

    let mut seen: HashSet<String> = records
        .iter()
        .filter_map(|r| r.get("scene_id").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    for scene in scenes {
        if seen.insert(scene.scene_id().to_string()) {
            records.push(scene.record().clone());
        }
    }

    let count = records.len();
    let features: Vec<Value> = records.into_iter().map(record_to_feature).collect();
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    let content = serde_json::to_string_pretty(&collection)
        .map_err(|e| SatSearchError::SnapshotFormat(e.to_string()))?;
    fs::write(path, content).await?;
    tracing::info!("Saved {} scenes to {}", count, path.display());
    Ok(())
}

/// Read a snapshot file back into scenes.
pub async fn load_scenes(path: &Path) -> Result<Vec<Scene>, SatSearchError> {
    let content = fs::read_to_string(path).await?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| SatSearchError::SnapshotFormat(e.to_string()))?;

    // A damaged snapshot must fail loudly; only a valid file with no
    // features may load as zero scenes.
    let records: Vec<Value> = match value {
        Value::Object(ref map) if map.contains_key("features") => {
            let features = map.get("features").and_then(Value::as_array).ok_or_else(|| {
                SatSearchError::SnapshotFormat(format!(
                    "{}: features is not an array",
                    path.display()
                ))
            })?;
            features
                .iter()
                .map(|f| match f.get("properties") {
                    Some(props @ Value::Object(_)) => Ok(props.clone()),
                    _ => Err(SatSearchError::SnapshotFormat(format!(
                        "{}: feature has no properties object",
                        path.display()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        Value::Array(records) => records,
        _ => {
            return Err(SatSearchError::SnapshotFormat(format!(
                "{} is neither a FeatureCollection nor a record array",
                path.display()
            )));
        }
    };

    records.into_iter().map(Scene::from_record).collect()
}

fn record_to_feature(record: Map<String, Value>) -> Value {
    let geometry = record.get("data_geometry").cloned().unwrap_or(Value::Null);
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": Value::Object(record),
    })
}
