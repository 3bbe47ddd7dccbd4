//! A single paginated remote search.

use std::collections::BTreeMap;

use async_stream::try_stream;
use futures::{Stream, TryStreamExt, pin_mut};

use crate::api;
use crate::config::SearchConfig;
use crate::error::SatSearchError;
use crate::scene::Scene;

/// One remote search execution for one filter set.
///
/// Filter values are opaque strings at this layer; the endpoint decides
/// whether they are acceptable. Pagination is sequential, one request in
/// flight at a time, because result order depends on a stateful remote
/// cursor.
///
/// A `Query` can alternatively be backed by previously saved scenes
/// (see [`Query::from_scenes`]); the `found()`/`scenes()` contract is
/// identical, with no network traffic.
pub struct Query {
    params: BTreeMap<String, String>,
    config: SearchConfig,
    client: reqwest::Client,
    loaded: Option<Vec<Scene>>,
}

impl Query {
    /// Create a query for the given filter set.
    pub fn new(
        config: &SearchConfig,
        params: BTreeMap<String, String>,
    ) -> Result<Self, SatSearchError> {
        let client = api::build_client(config.timeout_secs)?;
        Ok(Self {
            params,
            config: config.clone(),
            client,
            loaded: None,
        })
    }

    /// Create a query backed by an already materialized result set,
    /// typically loaded from a snapshot file.
    pub fn from_scenes(
        config: &SearchConfig,
        scenes: Vec<Scene>,
    ) -> Result<Self, SatSearchError> {
        let client = api::build_client(config.timeout_secs)?;
        Ok(Self {
            params: BTreeMap::new(),
            config: config.clone(),
            client,
            loaded: Some(scenes),
        })
    }

    /// The filter set this query will send.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Total number of matching scenes reported by the endpoint.
    ///
    /// Issues a single page-one request; zero matches is a valid,
    /// successful outcome. Fails with [`SatSearchError`] when the
    /// endpoint rejects the filter set or the transport fails.
    pub async fn found(&self) -> Result<u64, SatSearchError> {
        if let Some(loaded) = &self.loaded {
            return Ok(loaded.len() as u64);
        }
        let page = api::fetch_page(
            &self.client,
            &self.config.api_url,
            &self.params,
            1,
            self.config.limit,
        )
        .await?;
        tracing::debug!("Query {:?} matched {} scenes", self.params, page.meta.found);
        Ok(page.meta.found)
    }

    /// All matching scenes, in the order the endpoint returns them.
    ///
    /// All-or-nothing: a failure on any page discards everything already
    /// retrieved. Repeated calls re-issue pagination; only the
    /// snapshot-backed path reuses materialized scenes.
    pub async fn scenes(&self) -> Result<Vec<Scene>, SatSearchError> {
        let stream = self.stream();
        pin_mut!(stream);
        stream.try_collect().await
    }

    /// Lazy variant of [`scenes`](Query::scenes) for consumers that stop
    /// early. Restartable: every call walks pagination from page one.
    ///
    /// Termination honors whichever signal the catalog gives first: the
    /// retrieved count reaching the reported total, or a short or empty
    /// page. The catalog is not transactionally consistent, so the total
    /// reported on page one may drift from what the walk yields; a short
    /// page always ends the walk rather than looping.
    pub fn stream(&self) -> impl Stream<Item = Result<Scene, SatSearchError>> + '_ {
        try_stream! {
            if let Some(loaded) = &self.loaded {
                for scene in loaded.iter().cloned() {
                    yield scene;
                }
            } else {
                let mut page_num = 1u64;
                let mut retrieved = 0u64;
                let mut total: Option<u64> = None;
                loop {
                    let page = api::fetch_page(
                        &self.client,
                        &self.config.api_url,
                        &self.params,
                        page_num,
                        self.config.limit,
                    )
                    .await?;
                    let reported = *total.get_or_insert(page.meta.found);
                    let page_size = effective_page_size(page.meta.limit, self.config.limit);
                    let batch = page.results.len();
                    for record in page.results {
                        let scene = Scene::from_record(record)?;
                        retrieved += 1;
                        yield scene;
                    }
                    tracing::debug!(
                        "Page {}: {} records ({}/{} retrieved)",
                        page_num,
                        batch,
                        retrieved,
                        reported
                    );
                    if walk_complete(batch, page_size, retrieved, reported) {
                        break;
                    }
                    page_num += 1;
                }
            }
        }
    }
}

/// Page size the walk should expect: the server echo when present,
/// otherwise the configured request size.
fn effective_page_size(meta_limit: u64, configured: usize) -> usize {
    if meta_limit > 0 {
        meta_limit as usize
    } else {
        configured
    }
}

/// Whether pagination is exhausted after a page of `batch` records.
///
/// A short or empty page always ends the walk, even when `retrieved` has
/// not reached the total `reported` on page one; the catalog may shrink
/// between requests and a stale total must not cause an endless loop.
fn walk_complete(batch: usize, page_size: usize, retrieved: u64, reported: u64) -> bool {
    batch == 0 || batch < page_size || retrieved >= reported
}
