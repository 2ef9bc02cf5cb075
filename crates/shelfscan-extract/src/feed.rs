//! Result feed for presentation subscribers.
//!
//! Every extraction pass publishes its product list once to a named
//! channel. The last publication is memoized, so a subscriber that attaches
//! after the pass reads it back instead of triggering another extraction.
//!
//! Built on [`tokio::sync::watch`]: publishing never blocks and never
//! fails, even with no subscribers. A subscriber that falls behind by more
//! than one pass only observes the newest publication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shelfscan_core::Product;
use tokio::sync::watch;

use crate::page::PageSnapshot;
use crate::pipeline::extract_products;

/// Default channel name for extraction results.
pub const PRODUCTS_EXTRACTED_CHANNEL: &str = "products-extracted";

/// One extraction pass as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    /// 1-based pass counter, incremented on every publish.
    pub run: u64,
    pub published_at: DateTime<Utc>,
    pub products: Arc<[Product]>,
}

/// Named single-slot pub/sub channel carrying the latest product list.
#[derive(Debug)]
pub struct ProductFeed {
    name: String,
    tx: watch::Sender<Option<Publication>>,
}

impl Default for ProductFeed {
    fn default() -> Self {
        Self::new(PRODUCTS_EXTRACTED_CHANNEL)
    }
}

impl ProductFeed {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            name: name.into(),
            tx,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `products` as the latest publication and wakes subscribers.
    pub fn publish(&self, products: Vec<Product>) -> Publication {
        let mut publication = Publication {
            run: 0,
            published_at: Utc::now(),
            products: products.into(),
        };
        self.tx.send_modify(|slot| {
            publication.run = slot.as_ref().map_or(1, |prev| prev.run + 1);
            *slot = Some(publication.clone());
        });
        tracing::debug!(
            channel = %self.name,
            run = publication.run,
            products = publication.products.len(),
            subscribers = self.tx.receiver_count(),
            "published extraction result"
        );
        publication
    }

    /// The memoized last publication, if any pass has run.
    #[must_use]
    pub fn latest(&self) -> Option<Publication> {
        self.tx.borrow().clone()
    }

    /// Attaches a subscriber. The current publication (if any) counts as
    /// already seen by [`FeedSubscriber::next`].
    #[must_use]
    pub fn subscribe(&self) -> FeedSubscriber {
        FeedSubscriber {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving end of a [`ProductFeed`].
#[derive(Debug, Clone)]
pub struct FeedSubscriber {
    rx: watch::Receiver<Option<Publication>>,
}

impl FeedSubscriber {
    /// Waits for the next publication. Returns `None` once the feed is
    /// dropped.
    pub async fn next(&mut self) -> Option<Publication> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(publication) = self.rx.borrow_and_update().clone() {
                return Some(publication);
            }
        }
    }

    /// Returns the current publication if one exists, otherwise waits for
    /// the first. For subscribers that may attach before or after a pass.
    pub async fn ready(&mut self) -> Option<Publication> {
        if let Some(publication) = self.rx.borrow_and_update().clone() {
            return Some(publication);
        }
        self.next().await
    }

    /// Reads the memoized slot without waiting.
    #[must_use]
    pub fn current(&self) -> Option<Publication> {
        self.rx.borrow().clone()
    }
}

/// Runs the pipeline over `page` and publishes the result to `feed`.
pub fn extract_and_publish(page: &PageSnapshot, feed: &ProductFeed) -> Publication {
    feed.publish(extract_products(page))
}
