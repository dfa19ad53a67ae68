//! Live view of one owner's expenses.
//!
//! `LiveLedger` owns a [`ChangeFeed`] and a [`LedgerStore`] for an explicit
//! owner and keeps the user's [`FilterSpec`]. Events are applied one at a time
//! in arrival order; the projection is recomputed on every read.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::{
    ChangeFeed, ExpenseRecord, FeedEvent, FilterSpec, LedgerStore, OwnerId, Projection,
    ResultLedger, filter, remote::DocumentStore,
};

pub struct LiveLedger<S: DocumentStore> {
    feed: ChangeFeed<S>,
    store: LedgerStore,
    filter: FilterSpec,
}

impl<S: DocumentStore> LiveLedger<S> {
    /// Subscribes to `owner`'s expenses.
    pub async fn start(source: Arc<S>, owner: OwnerId, timezone: Tz) -> ResultLedger<Self> {
        let mut ledger = Self {
            feed: ChangeFeed::new(source, timezone),
            store: LedgerStore::new(owner.clone()),
            filter: FilterSpec::default(),
        };
        ledger.switch_owner(owner).await?;
        Ok(ledger)
    }

    /// Replaces the subscription: the old feed is closed and the store
    /// emptied before the new owner's first event can be applied.
    pub async fn switch_owner(&mut self, owner: OwnerId) -> ResultLedger<()> {
        self.feed.close();
        self.store.reset(owner.clone()).await;
        self.feed.subscribe(owner)
    }

    /// Re-subscribes the current owner after a feed or invariant error.
    pub async fn resubscribe(&mut self) -> ResultLedger<()> {
        let owner = self.store.owner().await;
        self.switch_owner(owner).await
    }

    /// Waits for the next feed event and applies it.
    ///
    /// `Ok(None)` means the feed is closed.
    pub async fn next_change(&mut self) -> ResultLedger<Option<FeedEvent>> {
        let Some(event) = self.feed.next().await? else {
            return Ok(None);
        };
        self.store.apply(event.clone()).await?;
        Ok(Some(event))
    }

    /// Applies every event already delivered and returns how many there were.
    pub async fn drain(&mut self) -> ResultLedger<usize> {
        let mut applied = 0;
        while let Some(event) = self.feed.try_next()? {
            self.store.apply(event).await?;
            applied += 1;
        }
        Ok(applied)
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn is_live(&self) -> bool {
        self.feed.is_active()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub async fn snapshot(&self) -> Vec<ExpenseRecord> {
        self.store.snapshot().await
    }

    /// Filtered records and their total.
    pub async fn view(&self) -> Projection {
        let snapshot = self.store.snapshot().await;
        filter::project(&snapshot, &self.filter)
    }

    /// Closes the feed and forgets the owner's records.
    pub async fn stop(&mut self) {
        self.feed.close();
        let owner = self.store.owner().await;
        self.store.reset(owner).await;
    }
}
