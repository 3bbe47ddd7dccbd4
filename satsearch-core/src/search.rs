//! Composition of one or more queries behind a single
//! `found()`/`scenes()` contract.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;

use crate::config::SearchConfig;
use crate::error::SatSearchError;
use crate::query::Query;
use crate::scene::Scene;
use crate::snapshot;

/// Normalized search criteria supplied by the caller.
///
/// The CLI layer is responsible for splitting raw `--date` / `--clouds`
/// text into the from/to pairs here and for capturing `KEY=VALUE`
/// extras; this layer treats values as opaque filter strings apart from
/// range-consistency checks.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub cloud_from: Option<i64>,
    pub cloud_to: Option<i64>,
    pub satellite_name: Option<String>,
    /// GeoJSON geometry passed through verbatim.
    pub intersects: Option<String>,
    /// `lon,lat` point passed through verbatim.
    pub contains: Option<String>,
    /// The endpoint accepts one scene id per request, so each id here
    /// becomes its own constituent query.
    pub scene_ids: Vec<String>,
    /// Arbitrary extra filter parameters.
    pub params: BTreeMap<String, String>,
}

impl Criteria {
    fn validate(&self) -> Result<(), SatSearchError> {
        if let (Some(from), Some(to)) = (&self.date_from, &self.date_to) {
            let parsed_from = NaiveDate::parse_from_str(from, "%Y-%m-%d");
            let parsed_to = NaiveDate::parse_from_str(to, "%Y-%m-%d");
            // Unparseable dates stay opaque; the endpoint decides on those.
            if let (Ok(from), Ok(to)) = (parsed_from, parsed_to) {
                if from > to {
                    return Err(SatSearchError::InvalidCriteria(format!(
                        "date_from {from} is after date_to {to}"
                    )));
                }
            }
        }
        if let (Some(from), Some(to)) = (self.cloud_from, self.cloud_to) {
            if from > to {
                return Err(SatSearchError::InvalidCriteria(format!(
                    "cloud_from {from} is greater than cloud_to {to}"
                )));
            }
        }
        Ok(())
    }

    /// Expand into one filter set per constituent query.
    fn to_param_sets(&self) -> Vec<BTreeMap<String, String>> {
        let mut base = self.params.clone();
        if let Some(v) = &self.date_from {
            base.insert("date_from".to_string(), v.clone());
        }
        if let Some(v) = &self.date_to {
            base.insert("date_to".to_string(), v.clone());
        }
        if let Some(v) = self.cloud_from {
            base.insert("cloud_from".to_string(), v.to_string());
        }
        if let Some(v) = self.cloud_to {
            base.insert("cloud_to".to_string(), v.to_string());
        }
        if let Some(v) = &self.satellite_name {
            base.insert("satellite_name".to_string(), v.clone());
        }
        if let Some(v) = &self.intersects {
            base.insert("intersects".to_string(), v.clone());
        }
        if let Some(v) = &self.contains {
            base.insert("contains".to_string(), v.clone());
        }

        if self.scene_ids.is_empty() {
            return vec![base];
        }
        self.scene_ids
            .iter()
            .map(|id| {
                let mut params = base.clone();
                params.insert("scene_id".to_string(), id.clone());
                params
            })
            .collect()
    }
}

/// A logical search over one or more constituent [`Query`] executions.
///
/// Results are merged in constituent order and deduplicated by
/// `scene_id`, first occurrence wins. Any constituent failure fails the
/// whole search; there is no partial merge.
pub struct Search {
    queries: Vec<Query>,
}

impl Search {
    /// Build a search from criteria, splitting into one query per scene
    /// id when an id list is given.
    pub fn new(config: &SearchConfig, criteria: Criteria) -> Result<Self, SatSearchError> {
        criteria.validate()?;
        let queries = criteria
            .to_param_sets()
            .into_iter()
            .map(|params| Query::new(config, params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { queries })
    }

    /// Compose a search directly from prepared queries.
    pub fn from_queries(queries: Vec<Query>) -> Self {
        Self { queries }
    }

    /// Build a search over a previously saved snapshot file instead of
    /// the live endpoint; same contract, no network.
    pub async fn load(
        config: &SearchConfig,
        path: &Path,
    ) -> Result<Self, SatSearchError> {
        let scenes = snapshot::load_scenes(path).await?;
        tracing::info!("Loaded {} scenes from {}", scenes.len(), path.display());
        let query = Query::from_scenes(config, scenes)?;
        Ok(Self {
            queries: vec![query],
        })
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Number of unique scenes the merged result contains.
    ///
    /// With a single constituent this is the server-reported total; with
    /// several, constituent counts cannot simply be summed (result sets
    /// may overlap), so the merged set is materialized and counted.
    pub async fn found(&self) -> Result<u64, SatSearchError> {
        if self.queries.len() == 1 {
            return self.queries[0].found().await;
        }
        Ok(self.scenes().await?.len() as u64)
    }

    /// The merged, deduplicated scene collection.
    pub async fn scenes(&self) -> Result<Vec<Scene>, SatSearchError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();
        for query in &self.queries {
            for scene in query.scenes().await? {
                if seen.insert(scene.scene_id().to_string()) {
                    merged.push(scene);
                }
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> SearchConfig {
        SearchConfig::default()
    }

    fn scene(id: &str) -> Scene {
        Scene::from_record(json!({"scene_id": id, "date": "2017-01-05"})).unwrap()
    }

    fn snapshot_query(ids: &[&str]) -> Query {
        let scenes = ids.iter().map(|id| scene(id)).collect();
        Query::from_scenes(&test_config(), scenes).unwrap()
    }

    #[test]
    fn test_scene_id_list_splits_into_queries() {
        let criteria = Criteria {
            scene_ids: vec!["id1".to_string(), "id2".to_string(), "id3".to_string()],
            satellite_name: Some("Landsat-8".to_string()),
            ..Default::default()
        };
        let search = Search::new(&test_config(), criteria).unwrap();
        assert_eq!(search.queries().len(), 3);
        for (query, id) in search.queries().iter().zip(["id1", "id2", "id3"]) {
            assert_eq!(query.params().get("scene_id").map(String::as_str), Some(id));
            assert_eq!(
                query.params().get("satellite_name").map(String::as_str),
                Some("Landsat-8")
            );
        }
    }

    #[test]
    fn test_scalar_criteria_become_one_query() {
        let criteria = Criteria {
            date_from: Some("2017-01-01".to_string()),
            date_to: Some("2017-01-31".to_string()),
            cloud_from: Some(0),
            cloud_to: Some(20),
            ..Default::default()
        };
        let search = Search::new(&test_config(), criteria).unwrap();
        assert_eq!(search.queries().len(), 1);
        let params = search.queries()[0].params();
        assert_eq!(params.get("date_from").map(String::as_str), Some("2017-01-01"));
        assert_eq!(params.get("cloud_to").map(String::as_str), Some("20"));
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let criteria = Criteria {
            date_from: Some("2017-02-01".to_string()),
            date_to: Some("2017-01-01".to_string()),
            ..Default::default()
        };
        let result = Search::new(&test_config(), criteria);
        assert!(matches!(result, Err(SatSearchError::InvalidCriteria(_))));
    }

    #[test]
    fn test_inverted_cloud_range_is_rejected() {
        let criteria = Criteria {
            cloud_from: Some(50),
            cloud_to: Some(10),
            ..Default::default()
        };
        let result = Search::new(&test_config(), criteria);
        assert!(matches!(result, Err(SatSearchError::InvalidCriteria(_))));
    }

    #[tokio::test]
    async fn test_overlapping_queries_dedup_first_wins() {
        let search = Search::from_queries(vec![
            snapshot_query(&["a", "b"]),
            snapshot_query(&["b", "c"]),
            snapshot_query(&["c", "d", "a"]),
        ]);
        let scenes = search.scenes().await.unwrap();
        let ids: Vec<&str> = scenes.iter().map(Scene::scene_id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(search.found().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_query_collapse() {
        let search = Search::from_queries(vec![snapshot_query(&["a", "a", "b"])]);
        let scenes = search.scenes().await.unwrap();
        assert_eq!(scenes.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_order_is_deterministic() {
        let make = || {
            Search::from_queries(vec![
                snapshot_query(&["x", "y"]),
                snapshot_query(&["y", "z"]),
            ])
        };
        let first: Vec<String> = make()
            .scenes()
            .await
            .unwrap()
            .iter()
            .map(|s| s.scene_id().to_string())
            .collect();
        let second: Vec<String> = make()
            .scenes()
            .await
            .unwrap()
            .iter()
            .map(|s| s.scene_id().to_string())
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let search = Search::from_queries(vec![snapshot_query(&[])]);
        assert_eq!(search.found().await.unwrap(), 0);
        assert!(search.scenes().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_search_with_geometry() {
        let aoi = r#"{"type": "Polygon", "coordinates": [[[-5.0, 36.0],
            [-5.0, 37.0], [-4.0, 37.0], [-4.0, 36.0], [-5.0, 36.0]]]}"#;
        let criteria = Criteria {
            date_from: Some("2017-01-05".to_string()),
            date_to: Some("2017-01-05".to_string()),
            satellite_name: Some("Landsat-8".to_string()),
            intersects: Some(aoi.to_string()),
            ..Default::default()
        };
        let search = Search::new(&test_config(), criteria).unwrap();
        assert_eq!(search.found().await.unwrap(), 1);
        let scenes = search.scenes().await.unwrap();
        assert_eq!(scenes.len(), 1);
    }
}
