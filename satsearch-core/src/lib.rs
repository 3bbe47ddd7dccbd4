//! Client library for a satellite-imagery metadata search API.
//!
//! Builds paginated catalog queries from normalized search criteria,
//! walks result pages until exhaustion and exposes the matching scenes
//! as a deduplicated collection.
//!
//! - [`scene`] - Typed wrapper around one catalog record
//! - [`query`] - A single paginated remote search
//! - [`search`] - Composition of one or more queries with merge-by-id
//! - [`snapshot`] - Saving and loading result sets as GeoJSON files
//! - [`api`] - HTTP transport against the search endpoint
//! - [`config`] - Endpoint and download-layout configuration

pub mod api;
pub mod config;
pub mod error;
pub mod query;
pub mod scene;
pub mod search;
pub mod snapshot;

// Re-export commonly used types
pub use config::SearchConfig;
pub use error::SatSearchError;
pub use query::Query;
pub use scene::Scene;
pub use search::{Criteria, Search};
