//! Upstream metastore boundary: client trait and notification fetcher.

mod client;
mod fetcher;

pub use client::MetastoreClient;
pub use fetcher::{FetchOutcome, NotificationFetcher};
