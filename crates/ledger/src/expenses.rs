//! Expense writes issued by the presentation layer.
//!
//! These go straight to the remote store; the ledger only sees their effect
//! through the change feed.

use chrono_tz::Tz;

use crate::{
    ExpenseDraft, ExpenseId, ExpenseRecord, LedgerError, ResultLedger,
    remote::{DocumentStore, Session},
};

/// Writes a new expense for the signed-in user and returns its id.
pub fn create<S: DocumentStore>(
    store: &S,
    session: &Session,
    draft: &ExpenseDraft,
    timezone: Tz,
) -> ResultLedger<ExpenseId> {
    let fields = draft.to_fields(&session.owner, timezone)?;
    let id = store.add(fields)?;
    tracing::debug!("created expense {id} for {}", session.owner);
    Ok(ExpenseId::new(id))
}

/// Loads one of the user's expenses for the edit form.
pub fn load<S: DocumentStore>(
    store: &S,
    session: &Session,
    id: &ExpenseId,
    timezone: Tz,
) -> ResultLedger<ExpenseRecord> {
    let document = store.get(id.as_str())?;
    if document.fields.uid != session.owner.as_str() {
        return Err(LedgerError::KeyNotFound(id.to_string()));
    }
    ExpenseRecord::from_remote(&document, timezone)
}

/// Replaces description, amount and date of an existing expense.
pub fn update<S: DocumentStore>(
    store: &S,
    session: &Session,
    id: &ExpenseId,
    draft: &ExpenseDraft,
    timezone: Tz,
) -> ResultLedger<()> {
    let current = store.get(id.as_str())?;
    if current.fields.uid != session.owner.as_str() {
        return Err(LedgerError::KeyNotFound(id.to_string()));
    }
    store.update(id.as_str(), draft.to_fields(&session.owner, timezone)?)
}

pub fn delete<S: DocumentStore>(store: &S, session: &Session, id: &ExpenseId) -> ResultLedger<()> {
    let current = store.get(id.as_str())?;
    if current.fields.uid != session.owner.as_str() {
        return Err(LedgerError::KeyNotFound(id.to_string()));
    }
    store.delete(id.as_str())?;
    tracing::debug!("deleted expense {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{MemoryBackend, OwnerId};

    fn session(owner: &str) -> Session {
        Session {
            owner: OwnerId::new(owner),
            email: format!("{owner}@example.com"),
        }
    }

    #[test]
    fn create_update_delete() {
        let backend = MemoryBackend::new();
        let tz = chrono_tz::UTC;
        let me = session("u1");

        let draft = ExpenseDraft::parse("Lunch", "12,50", "2025-05-02").unwrap();
        let id = create(&backend, &me, &draft, tz).unwrap();
        let loaded = load(&backend, &me, &id, tz).unwrap();
        assert_eq!(loaded.description(), "Lunch");
        assert_eq!(loaded.amount(), Decimal::new(1250, 2));

        let edited = ExpenseDraft::parse("Dinner", "30", "2025-05-03").unwrap();
        update(&backend, &me, &id, &edited, tz).unwrap();
        let loaded = load(&backend, &me, &id, tz).unwrap();
        assert_eq!(loaded.description(), "Dinner");
        assert_eq!(loaded.iso_date(), "2025-05-03");

        delete(&backend, &me, &id).unwrap();
        assert_eq!(
            load(&backend, &me, &id, tz),
            Err(LedgerError::KeyNotFound(id.to_string()))
        );
    }

    #[test]
    fn other_users_expenses_are_invisible() {
        let backend = MemoryBackend::new();
        let tz = chrono_tz::UTC;
        let draft = ExpenseDraft::parse("Lunch", "10", "2025-05-02").unwrap();
        let id = create(&backend, &session("u1"), &draft, tz).unwrap();

        let intruder = session("u2");
        assert!(matches!(
            load(&backend, &intruder, &id, tz),
            Err(LedgerError::KeyNotFound(_))
        ));
        assert!(matches!(
            delete(&backend, &intruder, &id),
            Err(LedgerError::KeyNotFound(_))
        ));
        assert!(load(&backend, &session("u1"), &id, tz).is_ok());
    }
}
