//! The `FeedSource` trait and its HTTP implementation.

use std::future::Future;

use paddock_core::event::FeedEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

/// A source of raw feed snapshots. Abstracted so poll cycles can be driven
/// from canned batches in tests.
pub trait FeedSource: Send + Sync {
  /// Fetch the current feed snapshot — a bounded list of raw events.
  fn fetch(&self) -> impl Future<Output = Result<Vec<FeedEvent>, FetchError>> + Send + '_;
}

/// Fetches the feed over HTTP as a JSON array of events.
///
/// Transport-level retry and backoff are deliberately not handled here; a
/// failed fetch simply fails the cycle and the next scheduled poll tries
/// again.
pub struct HttpFeedSource {
  client: reqwest::Client,
  url:    String,
}

impl HttpFeedSource {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      url:    url.into(),
    }
  }
}

impl FeedSource for HttpFeedSource {
  async fn fetch(&self) -> Result<Vec<FeedEvent>, FetchError> {
    let events = self
      .client
      .get(&self.url)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(events)
  }
}
