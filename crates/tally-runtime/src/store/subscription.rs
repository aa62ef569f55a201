//! Live collection subscriptions.

use super::record::materialize;
use super::{Record, StoreError, SubscriptionError, Watch};
use tally_types::CollectionName;

/// A live view of one collection.
///
/// Each [`next`](Self::next) yields the full current membership. The
/// first call returns immediately with the state at subscription time;
/// later calls wait for the collection subtree to change.
///
/// Dropping the subscription (or calling [`release`](Self::release))
/// frees the underlying watch.
#[derive(Debug)]
pub struct CollectionSubscription {
    collection: CollectionName,
    watch: Watch,
    ended: bool,
}

impl CollectionSubscription {
    pub(crate) fn new(collection: CollectionName, watch: Watch) -> Self {
        Self {
            collection,
            watch,
            ended: false,
        }
    }

    /// Returns the subscribed collection.
    #[must_use]
    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the subscription has ended. A failure is
    /// delivered once as `Some(Err(_))` and ends the subscription.
    pub async fn next(&mut self) -> Option<Result<Vec<Record>, SubscriptionError>> {
        if self.ended {
            return None;
        }
        let outcome = match self.watch.next().await? {
            Ok(subtree) => materialize(&self.collection, &subtree),
            Err(StoreError::Closed) => Err(SubscriptionError::Closed {
                collection: self.collection.to_string(),
            }),
            Err(source) => Err(SubscriptionError::Watch {
                collection: self.collection.to_string(),
                source,
            }),
        };
        if let Err(e) = &outcome {
            tracing::warn!(collection = %self.collection, error = %e, "subscription ended");
            self.ended = true;
        }
        Some(outcome)
    }

    /// Releases the subscription. No further snapshots are delivered.
    pub fn release(self) {
        tracing::trace!(collection = %self.collection, "subscription released");
    }
}
