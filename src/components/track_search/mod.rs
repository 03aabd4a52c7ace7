mod youtube;

pub use youtube::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no track matches the title")]
    NotFound,
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search service answered with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait TrackSearch: Send + Sync + 'static {
    /// Resolves a free-text title to a playable media url.
    async fn resolve(&self, title: &str) -> Result<String, SearchError>;
}
