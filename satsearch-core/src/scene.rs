use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::SatSearchError;

/// One catalog record describing a single satellite image acquisition.
///
/// A `Scene` wraps the raw JSON record returned by the API and is
/// read-only after construction. `scene_id` is guaranteed non-empty and
/// serves as the deduplication key when results from several queries are
/// merged.
#[derive(Debug, Clone)]
pub struct Scene {
    record: Map<String, Value>,
}

impl Scene {
    /// Parse one raw record from a response page.
    ///
    /// Records without a non-empty `scene_id` string are a hard failure,
    /// never a silently empty scene.
    pub fn from_record(value: Value) -> Result<Self, SatSearchError> {
        let record = match value {
            Value::Object(map) => map,
            other => {
                return Err(SatSearchError::UnexpectedResponse(format!(
                    "scene record is not a JSON object: {other}"
                )));
            }
        };
        match record.get("scene_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {}
            _ => return Err(SatSearchError::MissingSceneId),
        }
        Ok(Self { record })
    }

    pub fn scene_id(&self) -> &str {
        // Validated non-empty in from_record
        self.record
            .get("scene_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Acquisition date, when the record carries a parseable `date`.
    pub fn date(&self) -> Option<NaiveDate> {
        self.string_value("date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn satellite_name(&self) -> Option<&str> {
        self.string_value("satellite_name")
    }

    pub fn cloud_coverage(&self) -> Option<f64> {
        self.record.get("cloud_coverage").and_then(Value::as_f64)
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.string_value("thumbnail")
    }

    /// Footprint geometry of the acquisition, when present.
    pub fn geometry(&self) -> Option<&Value> {
        self.record.get("data_geometry")
    }

    /// Raw metadata lookup by key.
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn string_value(&self, key: &str) -> Option<&str> {
        self.record.get(key).and_then(Value::as_str)
    }

    /// Scalar metadata rendered as a string, for filename and directory
    /// templating in the download layer.
    pub fn metadata_string(&self, key: &str) -> Option<String> {
        match self.record.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Named downloadable assets (asset name to URI).
    pub fn download_links(&self) -> HashMap<String, String> {
        let mut links = HashMap::new();
        if let Some(Value::Object(map)) = self.record.get("download_links") {
            for (name, url) in map {
                if let Some(url) = url.as_str() {
                    links.insert(name.clone(), url.to_string());
                }
            }
        }
        links
    }

    /// URI of a named asset. Falls back to a top-level string key so the
    /// thumbnail is addressable like any other asset.
    pub fn asset_url(&self, name: &str) -> Option<String> {
        if let Some(Value::Object(map)) = self.record.get("download_links") {
            if let Some(url) = map.get(name).and_then(Value::as_str) {
                return Some(url.to_string());
            }
        }
        self.string_value(name).map(str::to_string)
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn into_record(self) -> Map<String, Value> {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn landsat_record() -> Value {
        json!({
            "scene_id": "LC80120312017001LGN00",
            "satellite_name": "Landsat-8",
            "date": "2017-01-01",
            "cloud_coverage": 22.08,
            "path": "12",
            "row": "31",
            "thumbnail": "https://example.com/thumb.jpg",
            "download_links": {
                "aws_s3": "https://example.com/scene/index.html",
                "usgs": "https://example.com/scene.tar.gz"
            },
            "data_geometry": {"type": "Polygon", "coordinates": []}
        })
    }

    #[test]
    fn test_parse_record() {
        let scene = Scene::from_record(landsat_record()).unwrap();
        assert_eq!(scene.scene_id(), "LC80120312017001LGN00");
        assert_eq!(scene.satellite_name(), Some("Landsat-8"));
        assert_eq!(scene.cloud_coverage(), Some(22.08));
        assert_eq!(
            scene.date(),
            Some(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_missing_scene_id() {
        let result = Scene::from_record(json!({"satellite_name": "Landsat-8"}));
        assert!(matches!(result, Err(SatSearchError::MissingSceneId)));
    }

    #[test]
    fn test_empty_scene_id() {
        let result = Scene::from_record(json!({"scene_id": ""}));
        assert!(matches!(result, Err(SatSearchError::MissingSceneId)));
    }

    #[test]
    fn test_non_object_record() {
        let result = Scene::from_record(json!(["not", "a", "record"]));
        assert!(matches!(result, Err(SatSearchError::UnexpectedResponse(_))));
    }

    #[test]
    fn test_download_links() {
        let scene = Scene::from_record(landsat_record()).unwrap();
        let links = scene.download_links();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links.get("usgs").map(String::as_str),
            Some("https://example.com/scene.tar.gz")
        );
    }

    #[test]
    fn test_asset_url_falls_back_to_top_level() {
        let scene = Scene::from_record(landsat_record()).unwrap();
        assert_eq!(
            scene.asset_url("thumbnail").as_deref(),
            Some("https://example.com/thumb.jpg")
        );
        assert!(scene.asset_url("nosuchasset").is_none());
    }

    #[test]
    fn test_metadata_string_renders_scalars() {
        let scene = Scene::from_record(landsat_record()).unwrap();
        assert_eq!(scene.metadata_string("path").as_deref(), Some("12"));
        assert_eq!(scene.metadata_string("cloud_coverage").as_deref(), Some("22.08"));
        assert!(scene.metadata_string("download_links").is_none());
    }
}
