//! In-memory hosted backend.
//!
//! `MemoryBackend` implements both [`DocumentStore`] and [`AuthService`]. Every
//! write pushes a change batch to the listeners of the document's owner, the
//! same way the hosted store does. It also lets callers simulate an
//! unreachable backend and dropped connections.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::{
    LedgerError, OwnerId, ResultLedger,
    remote::{
        AuthService, ChangeKind, DocumentChange, DocumentStore, ExpenseFields, Listener,
        ListenerId, Profile, RemoteDocument, RemoteEvent, Session,
    },
};

const MIN_PASSWORD_LEN: usize = 6;

/// One write of an atomic batch.
#[derive(Clone, Debug)]
pub enum BatchWrite {
    Add { id: String, fields: ExpenseFields },
    Update { id: String, fields: ExpenseFields },
    Delete { id: String },
}

struct Registered {
    owner: OwnerId,
    listener: Listener,
}

struct Account {
    owner: OwnerId,
    password: String,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, RemoteDocument>,
    listeners: HashMap<ListenerId, Registered>,
    accounts: HashMap<String, Account>,
    profiles: HashMap<OwnerId, Profile>,
    signed_in: HashSet<OwnerId>,
    reset_requests: Vec<String>,
    offline: bool,
}

impl Inner {
    fn ensure_online(&self) -> ResultLedger<()> {
        if self.offline {
            return Err(LedgerError::Remote("backend unreachable".to_string()));
        }
        Ok(())
    }

    /// Applies one write and returns the resulting change.
    fn write(&mut self, write: BatchWrite) -> ResultLedger<DocumentChange> {
        match write {
            BatchWrite::Add { id, fields } => {
                if self.documents.contains_key(&id) {
                    return Err(LedgerError::Remote(format!("document {id} already exists")));
                }
                let document = RemoteDocument { id: id.clone(), fields };
                self.documents.insert(id, document.clone());
                Ok(DocumentChange {
                    kind: ChangeKind::Added,
                    document,
                })
            }
            BatchWrite::Update { id, fields } => {
                let document = self
                    .documents
                    .get_mut(&id)
                    .ok_or_else(|| LedgerError::KeyNotFound(id.clone()))?;
                if document.fields.uid != fields.uid {
                    return Err(LedgerError::Remote(format!(
                        "owner of document {id} cannot change"
                    )));
                }
                document.fields = fields;
                Ok(DocumentChange {
                    kind: ChangeKind::Modified,
                    document: document.clone(),
                })
            }
            BatchWrite::Delete { id } => {
                let document = self
                    .documents
                    .remove(&id)
                    .ok_or_else(|| LedgerError::KeyNotFound(id.clone()))?;
                Ok(DocumentChange {
                    kind: ChangeKind::Removed,
                    document,
                })
            }
        }
    }

    /// Delivers `changes` to every listener, each one receiving only its
    /// owner's changes in the original order.
    fn notify(&self, changes: &[DocumentChange]) {
        for registered in self.listeners.values() {
            let batch: Vec<DocumentChange> = changes
                .iter()
                .filter(|change| change.document.fields.uid == registered.owner.as_str())
                .cloned()
                .collect();
            if !batch.is_empty() {
                (registered.listener)(RemoteEvent::Changes(batch));
            }
        }
    }
}

/// In-process backend used by tests and the demo binary.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ResultLedger<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Remote("backend state poisoned".to_string()))
    }

    /// Creates a document with a caller-chosen id.
    pub fn add_with_id(&self, id: &str, fields: ExpenseFields) -> ResultLedger<()> {
        self.write_batch(vec![BatchWrite::Add {
            id: id.to_string(),
            fields,
        }])
    }

    /// Applies all writes atomically and notifies listeners once per owner.
    ///
    /// Nothing is written when one of the writes fails.
    pub fn write_batch(&self, writes: Vec<BatchWrite>) -> ResultLedger<()> {
        let mut inner = self.lock()?;
        inner.ensure_online()?;

        let before = inner.documents.clone();
        let mut changes = Vec::with_capacity(writes.len());
        for write in writes {
            match inner.write(write) {
                Ok(change) => changes.push(change),
                Err(err) => {
                    inner.documents = before;
                    return Err(err);
                }
            }
        }
        inner.notify(&changes);
        Ok(())
    }

    /// Makes every subsequent call fail as if the network was down.
    pub fn set_offline(&self, offline: bool) -> ResultLedger<()> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Drops every active listener, telling each one why.
    pub fn disconnect_listeners(&self, reason: &str) -> ResultLedger<()> {
        let mut inner = self.lock()?;
        for (_, registered) in inner.listeners.drain() {
            (registered.listener)(RemoteEvent::Error(reason.to_string()));
        }
        Ok(())
    }

    pub fn listener_count(&self) -> ResultLedger<usize> {
        Ok(self.lock()?.listeners.len())
    }

    /// Emails that asked for a password reset, oldest first.
    pub fn password_reset_requests(&self) -> ResultLedger<Vec<String>> {
        Ok(self.lock()?.reset_requests.clone())
    }

    pub fn is_signed_in(&self, owner: &OwnerId) -> ResultLedger<bool> {
        Ok(self.lock()?.signed_in.contains(owner))
    }
}

impl DocumentStore for MemoryBackend {
    fn add(&self, fields: ExpenseFields) -> ResultLedger<String> {
        let id = Uuid::new_v4().to_string();
        self.add_with_id(&id, fields)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> ResultLedger<RemoteDocument> {
        let inner = self.lock()?;
        inner.ensure_online()?;
        inner
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::KeyNotFound(id.to_string()))
    }

    fn update(&self, id: &str, fields: ExpenseFields) -> ResultLedger<()> {
        self.write_batch(vec![BatchWrite::Update {
            id: id.to_string(),
            fields,
        }])
    }

    fn delete(&self, id: &str) -> ResultLedger<()> {
        self.write_batch(vec![BatchWrite::Delete { id: id.to_string() }])
    }

    fn listen(&self, owner: &OwnerId, listener: Listener) -> ResultLedger<ListenerId> {
        let mut inner = self.lock()?;
        inner.ensure_online()?;

        let initial: Vec<DocumentChange> = inner
            .documents
            .values()
            .filter(|document| document.fields.uid == owner.as_str())
            .map(|document| DocumentChange {
                kind: ChangeKind::Added,
                document: document.clone(),
            })
            .collect();
        listener(RemoteEvent::Changes(initial));

        let id = ListenerId(Uuid::new_v4());
        inner.listeners.insert(
            id,
            Registered {
                owner: owner.clone(),
                listener,
            },
        );
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.listeners.remove(&id);
    }
}

impl AuthService for MemoryBackend {
    fn sign_up(
        &self,
        name: &str,
        phone: &str,
        email: &str,
        password: &str,
    ) -> ResultLedger<Session> {
        let mut inner = self.lock()?;
        inner.ensure_online()?;

        let key = email.trim().to_lowercase();
        if !key.contains('@') {
            return Err(LedgerError::Auth(format!("invalid email: {email}")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LedgerError::Auth(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if inner.accounts.contains_key(&key) {
            return Err(LedgerError::Auth(format!("email already in use: {key}")));
        }

        let owner = OwnerId::new(Uuid::new_v4().to_string());
        inner.accounts.insert(
            key.clone(),
            Account {
                owner: owner.clone(),
                password: password.to_string(),
            },
        );
        inner.profiles.insert(
            owner.clone(),
            Profile {
                owner: owner.clone(),
                name: name.trim().to_string(),
                phone: phone.trim().to_string(),
                email: key.clone(),
            },
        );
        inner.signed_in.insert(owner.clone());
        Ok(Session { owner, email: key })
    }

    fn sign_in(&self, email: &str, password: &str) -> ResultLedger<Session> {
        let mut inner = self.lock()?;
        inner.ensure_online()?;

        let key = email.trim().to_lowercase();
        let owner = match inner.accounts.get(&key) {
            Some(account) if account.password == password => account.owner.clone(),
            _ => return Err(LedgerError::Auth("invalid email or password".to_string())),
        };
        inner.signed_in.insert(owner.clone());
        Ok(Session { owner, email: key })
    }

    fn sign_out(&self, session: &Session) -> ResultLedger<()> {
        let mut inner = self.lock()?;
        inner.signed_in.remove(&session.owner);
        Ok(())
    }

    fn send_password_reset(&self, email: &str) -> ResultLedger<()> {
        let mut inner = self.lock()?;
        inner.ensure_online()?;

        let key = email.trim().to_lowercase();
        if !inner.accounts.contains_key(&key) {
            return Err(LedgerError::Auth(format!("no account for {key}")));
        }
        inner.reset_requests.push(key);
        Ok(())
    }

    fn profile(&self, owner: &OwnerId) -> ResultLedger<Profile> {
        let inner = self.lock()?;
        inner.ensure_online()?;
        inner
            .profiles
            .get(owner)
            .cloned()
            .ok_or_else(|| LedgerError::KeyNotFound(owner.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use super::*;

    fn fields(uid: &str, description: &str, value: f64) -> ExpenseFields {
        ExpenseFields {
            uid: uid.to_string(),
            description: description.to_string(),
            value,
            date: Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
        }
    }

    fn recording_listener() -> (Listener, Arc<Mutex<Vec<RemoteEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Listener =
            Box::new(move |event: RemoteEvent| sink.lock().unwrap().push(event));
        (listener, seen)
    }

    #[test]
    fn listen_delivers_initial_snapshot_for_owner_only() {
        let backend = MemoryBackend::new();
        backend.add_with_id("a", fields("u1", "Rent", 100.0)).unwrap();
        backend.add_with_id("x", fields("u2", "Other", 1.0)).unwrap();

        let (listener, seen) = recording_listener();
        backend.listen(&OwnerId::new("u1"), listener).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let RemoteEvent::Changes(changes) = &seen[0] else {
            panic!("expected changes");
        };
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[0].document.id, "a");
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let backend = MemoryBackend::new();
        let err = backend
            .write_batch(vec![
                BatchWrite::Add {
                    id: "a".to_string(),
                    fields: fields("u1", "Rent", 100.0),
                },
                BatchWrite::Delete {
                    id: "missing".to_string(),
                },
            ])
            .unwrap_err();
        assert_eq!(err, LedgerError::KeyNotFound("missing".to_string()));
        assert!(backend.get("a").is_err());
    }

    #[test]
    fn owner_cannot_change_on_update() {
        let backend = MemoryBackend::new();
        backend.add_with_id("a", fields("u1", "Rent", 100.0)).unwrap();
        let err = backend.update("a", fields("u2", "Rent", 100.0)).unwrap_err();
        assert!(matches!(err, LedgerError::Remote(_)));
    }

    #[test]
    fn unlisten_stops_delivery() {
        let backend = MemoryBackend::new();
        let (listener, seen) = recording_listener();
        let id = backend.listen(&OwnerId::new("u1"), listener).unwrap();
        backend.unlisten(id);

        backend.add_with_id("a", fields("u1", "Rent", 100.0)).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(backend.listener_count().unwrap(), 0);
    }

    #[test]
    fn offline_backend_refuses_calls() {
        let backend = MemoryBackend::new();
        backend.set_offline(true).unwrap();
        let (listener, _) = recording_listener();
        assert!(matches!(
            backend.listen(&OwnerId::new("u1"), listener),
            Err(LedgerError::Remote(_))
        ));
        assert!(matches!(
            backend.add(fields("u1", "Rent", 100.0)),
            Err(LedgerError::Remote(_))
        ));
    }

    #[test]
    fn accounts_sign_up_in_and_reset() {
        let backend = MemoryBackend::new();
        let session = backend
            .sign_up("Ana", "5551234", "Ana@Example.com", "secret1")
            .unwrap();
        assert_eq!(session.email, "ana@example.com");
        assert!(backend.is_signed_in(&session.owner).unwrap());

        backend.sign_out(&session).unwrap();
        assert!(!backend.is_signed_in(&session.owner).unwrap());

        assert!(matches!(
            backend.sign_in("ana@example.com", "wrong"),
            Err(LedgerError::Auth(_))
        ));
        let again = backend.sign_in("ana@example.com", "secret1").unwrap();
        assert_eq!(again.owner, session.owner);

        backend.send_password_reset("ana@example.com").unwrap();
        assert_eq!(
            backend.password_reset_requests().unwrap(),
            vec!["ana@example.com".to_string()]
        );

        let profile = backend.profile(&session.owner).unwrap();
        assert_eq!(profile.name, "Ana");
    }

    #[test]
    fn sign_up_rejects_weak_password_and_duplicates() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.sign_up("Ana", "1", "ana@example.com", "123"),
            Err(LedgerError::Auth(_))
        ));
        backend
            .sign_up("Ana", "1", "ana@example.com", "123456")
            .unwrap();
        assert!(matches!(
            backend.sign_up("Ana", "1", "ANA@example.com", "123456"),
            Err(LedgerError::Auth(_))
        ));
    }
}
