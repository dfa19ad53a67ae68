//! Remote change feed.
//!
//! `ChangeFeed` wraps the push-based listener of a [`DocumentStore`] and turns
//! the provider's change batches into an ordered sequence of [`FeedEvent`]s
//! for a single owner. The listener callback runs on the provider's context
//! and only forwards into a channel; events are pulled with
//! [`ChangeFeed::next`].

use std::{collections::VecDeque, sync::Arc};

use chrono_tz::Tz;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::{
    ExpenseId, ExpenseRecord, LedgerError, OwnerId, ResultLedger,
    remote::{ChangeKind, DocumentChange, DocumentStore, ListenerId, RemoteEvent},
};

/// Normalized notification derived from a remote change.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Upserted(ExpenseRecord),
    Removed(ExpenseId),
}

impl FeedEvent {
    pub fn id(&self) -> &ExpenseId {
        match self {
            Self::Upserted(record) => record.id(),
            Self::Removed(id) => id,
        }
    }
}

#[derive(Debug)]
enum FeedMessage {
    Events(Vec<FeedEvent>),
    Failed(String),
}

struct ActiveSubscription {
    owner: OwnerId,
    listener: ListenerId,
    receiver: UnboundedReceiver<FeedMessage>,
    pending: VecDeque<FeedEvent>,
}

/// Single-subscription adapter over a remote expense collection.
pub struct ChangeFeed<S: DocumentStore> {
    source: Arc<S>,
    timezone: Tz,
    active: Option<ActiveSubscription>,
}

impl<S: DocumentStore> ChangeFeed<S> {
    /// Creates an idle feed. Remote timestamps are read in `timezone`.
    pub fn new(source: Arc<S>, timezone: Tz) -> Self {
        Self {
            source,
            timezone,
            active: None,
        }
    }

    /// Owner of the active subscription, if any.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.active.as_ref().map(|active| &active.owner)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Opens the subscription for `owner`, closing the previous one first.
    ///
    /// Fails with [`LedgerError::Feed`] when the provider refuses the
    /// listener; the feed is then idle.
    pub fn subscribe(&mut self, owner: OwnerId) -> ResultLedger<()> {
        self.close();

        let (sender, receiver) = mpsc::unbounded_channel();
        let timezone = self.timezone;
        let listener = self
            .source
            .listen(
                &owner,
                Box::new(move |event| forward(&sender, event, timezone)),
            )
            .map_err(|err| {
                tracing::warn!("subscription for {owner} refused: {err}");
                LedgerError::Feed(format!("cannot subscribe: {err}"))
            })?;

        tracing::info!("subscribed to expenses of {owner}");
        self.active = Some(ActiveSubscription {
            owner,
            listener,
            receiver,
            pending: VecDeque::new(),
        });
        Ok(())
    }

    /// Waits for the next event.
    ///
    /// Returns `Ok(None)` when no subscription is active. A provider failure is
    /// reported once as [`LedgerError::Feed`]; the subscription is then
    /// terminated and nothing else is emitted until [`subscribe`] is called.
    ///
    /// [`subscribe`]: ChangeFeed::subscribe
    pub async fn next(&mut self) -> ResultLedger<Option<FeedEvent>> {
        loop {
            let message = match self.active.as_mut() {
                None => return Ok(None),
                Some(active) => {
                    if let Some(event) = active.pending.pop_front() {
                        return Ok(Some(event));
                    }
                    active.receiver.recv().await
                }
            };
            self.receive(message)?;
        }
    }

    /// Returns the next event that was already delivered, without waiting.
    pub fn try_next(&mut self) -> ResultLedger<Option<FeedEvent>> {
        loop {
            let message = match self.active.as_mut() {
                None => return Ok(None),
                Some(active) => {
                    if let Some(event) = active.pending.pop_front() {
                        return Ok(Some(event));
                    }
                    match active.receiver.try_recv() {
                        Ok(message) => Some(message),
                        Err(TryRecvError::Empty) => return Ok(None),
                        Err(TryRecvError::Disconnected) => None,
                    }
                }
            };
            self.receive(message)?;
        }
    }

    fn receive(&mut self, message: Option<FeedMessage>) -> ResultLedger<()> {
        match message {
            Some(FeedMessage::Events(events)) => {
                if let Some(active) = self.active.as_mut() {
                    active.pending.extend(events);
                }
                Ok(())
            }
            Some(FeedMessage::Failed(reason)) => {
                tracing::warn!("expense feed interrupted: {reason}");
                self.close();
                Err(LedgerError::Feed(reason))
            }
            None => {
                tracing::warn!("expense feed dropped by the provider");
                self.close();
                Err(LedgerError::Feed("subscription dropped".to_string()))
            }
        }
    }

    /// Terminates the active subscription.
    ///
    /// Synchronous: once this returns, no event of the closed subscription is
    /// yielded, including the ones already buffered.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            self.source.unlisten(active.listener);
            tracing::info!("closed expense feed of {}", active.owner);
        }
    }
}

impl<S: DocumentStore> Drop for ChangeFeed<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs on the provider's context.
fn forward(sender: &UnboundedSender<FeedMessage>, event: RemoteEvent, timezone: Tz) {
    let message = match event {
        RemoteEvent::Changes(changes) => FeedMessage::Events(
            changes
                .iter()
                .filter_map(|change| to_feed_event(change, timezone))
                .collect(),
        ),
        RemoteEvent::Error(reason) => FeedMessage::Failed(reason),
    };
    // The receiver is gone once the feed is closed.
    let _ = sender.send(message);
}

/// An invalid added document is skipped. An invalid modification evicts the
/// previous version, which the remote store no longer holds.
fn to_feed_event(change: &DocumentChange, timezone: Tz) -> Option<FeedEvent> {
    let id = || ExpenseId::new(change.document.id.clone());
    match change.kind {
        ChangeKind::Removed => Some(FeedEvent::Removed(id())),
        ChangeKind::Added => match ExpenseRecord::from_remote(&change.document, timezone) {
            Ok(record) => Some(FeedEvent::Upserted(record)),
            Err(err) => {
                tracing::warn!("skipping remote document {}: {err}", change.document.id);
                None
            }
        },
        ChangeKind::Modified => match ExpenseRecord::from_remote(&change.document, timezone) {
            Ok(record) => Some(FeedEvent::Upserted(record)),
            Err(err) => {
                tracing::warn!("evicting remote document {}: {err}", change.document.id);
                Some(FeedEvent::Removed(id()))
            }
        },
    }
}
