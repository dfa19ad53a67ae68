//! Contracts of the hosted backend the ledger talks to.
//!
//! The backend owns both authentication and the expense documents. The ledger
//! only depends on these traits; [`MemoryBackend`](crate::MemoryBackend) is
//! the in-process implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{OwnerId, ResultLedger};

/// Expense document as the remote store keeps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFields {
    pub uid: String,
    pub description: String,
    pub value: f64,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: ExpenseFields,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub document: RemoteDocument,
}

/// What a listener receives from the remote store.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    /// One change batch, in the provider's order.
    Changes(Vec<DocumentChange>),
    /// The listener was dropped by the provider and will receive nothing else.
    Error(String),
}

/// Callback registered with [`DocumentStore::listen`].
///
/// It runs on the provider's execution context and must not block.
pub type Listener = Box<dyn Fn(RemoteEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

/// Expense collection of the remote store.
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns the id the store assigned.
    fn add(&self, fields: ExpenseFields) -> ResultLedger<String>;

    fn get(&self, id: &str) -> ResultLedger<RemoteDocument>;

    /// Replaces the fields of an existing document.
    fn update(&self, id: &str, fields: ExpenseFields) -> ResultLedger<()>;

    fn delete(&self, id: &str) -> ResultLedger<()>;

    /// Registers `listener` for documents whose `uid` equals `owner`.
    ///
    /// The first delivery is one `Added` change per existing document.
    fn listen(&self, owner: &OwnerId, listener: Listener) -> ResultLedger<ListenerId>;

    /// Unregisters a listener. Once this returns the listener is never invoked
    /// again. Unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);
}

/// Authenticated session handed out by the auth service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub owner: OwnerId,
    pub email: String,
}

/// Account data saved at registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub owner: OwnerId,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Authentication half of the hosted backend.
pub trait AuthService: Send + Sync {
    fn sign_up(&self, name: &str, phone: &str, email: &str, password: &str)
    -> ResultLedger<Session>;

    fn sign_in(&self, email: &str, password: &str) -> ResultLedger<Session>;

    fn sign_out(&self, session: &Session) -> ResultLedger<()>;

    /// Sends a password-reset link to `email`.
    fn send_password_reset(&self, email: &str) -> ResultLedger<()>;

    fn profile(&self, owner: &OwnerId) -> ResultLedger<Profile>;
}
