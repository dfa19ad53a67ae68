//! In-memory ledger of the current owner's expenses.
//!
//! The store never originates changes: it only reflects the [`FeedEvent`]s it
//! is given. Handles are cheap to clone and share the same state.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{ExpenseId, ExpenseRecord, FeedEvent, LedgerError, OwnerId, ResultLedger};

#[derive(Debug)]
struct Inner {
    owner: OwnerId,
    records: HashMap<ExpenseId, ExpenseRecord>,
    fault: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LedgerStore {
    inner: Arc<RwLock<Inner>>,
}

impl LedgerStore {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                owner,
                records: HashMap::new(),
                fault: None,
            })),
        }
    }

    pub async fn owner(&self) -> OwnerId {
        self.inner.read().await.owner.clone()
    }

    /// Applies one feed event.
    ///
    /// Upserts replace by id in arrival order; removing an unknown id is a
    /// no-op. An upsert for another owner fails with
    /// [`LedgerError::InvariantViolation`] and faults the store until
    /// [`reset`](LedgerStore::reset).
    pub async fn apply(&self, event: FeedEvent) -> ResultLedger<()> {
        let mut inner = self.inner.write().await;
        if let Some(fault) = &inner.fault {
            return Err(LedgerError::InvariantViolation(format!(
                "store needs a reset: {fault}"
            )));
        }

        tracing::trace!("applying change to {}", event.id());
        match event {
            FeedEvent::Upserted(record) => {
                if record.owner() != &inner.owner {
                    let fault = format!(
                        "record {} belongs to {}, store owner is {}",
                        record.id(),
                        record.owner(),
                        inner.owner
                    );
                    tracing::error!("{fault}");
                    inner.fault = Some(fault.clone());
                    return Err(LedgerError::InvariantViolation(fault));
                }
                inner.records.insert(record.id().clone(), record);
            }
            FeedEvent::Removed(id) => {
                inner.records.remove(&id);
            }
        }
        Ok(())
    }

    /// Current records, newest date first, ties by ascending id.
    pub async fn snapshot(&self) -> Vec<ExpenseRecord> {
        let mut records: Vec<ExpenseRecord> =
            self.inner.read().await.records.values().cloned().collect();
        records.sort_by(|a, b| {
            Reverse(a.occurred_on())
                .cmp(&Reverse(b.occurred_on()))
                .then_with(|| a.id().cmp(b.id()))
        });
        records
    }

    /// Drops every record and switches to `owner`.
    pub async fn reset(&self, owner: OwnerId) {
        let mut inner = self.inner.write().await;
        tracing::debug!(
            "resetting ledger of {} ({} records) for {owner}",
            inner.owner,
            inner.records.len()
        );
        inner.records = HashMap::new();
        inner.fault = None;
        inner.owner = owner;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    pub async fn is_faulted(&self) -> bool {
        self.inner.read().await.fault.is_some()
    }
}
