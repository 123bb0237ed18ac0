//! Feed ingestion for paddock: polling, sequencing, and causal backfill.
//!
//! The feed is a snapshot endpoint, not an incremental delta — every cycle
//! re-delivers recent events, out of order and with duplicates. This crate
//! turns that into an ordered stream of newly accepted events and drives
//! them through the store's transactional applier, one event per
//! transaction, invalidating the status cache after each commit.

pub mod poller;
pub mod source;

pub use poller::{CycleSummary, PollError, Poller};
pub use source::{FeedSource, FetchError, HttpFeedSource};
