//! The module contains the `ExpenseRecord` type, the normalized expense the
//! ledger keeps in memory.
//!
//! Records are passive values: they are built from remote documents by the
//! change feed and never originate writes.
use core::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    LedgerError, ResultLedger, amount,
    remote::{ExpenseFields, RemoteDocument},
};

/// Opaque identifier assigned by the remote store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the authenticated user owning a record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single personal expense.
///
/// Two records are equal when they share the same `id`, whatever their
/// content.
#[derive(Clone, Debug)]
pub struct ExpenseRecord {
    id: ExpenseId,
    owner: OwnerId,
    description: String,
    amount: Decimal,
    occurred_on: NaiveDate,
}

impl ExpenseRecord {
    /// Builds a validated record.
    ///
    /// Fails with [`LedgerError::Validation`] when the description is blank or
    /// the amount is not strictly positive.
    pub fn new(
        id: ExpenseId,
        owner: OwnerId,
        description: impl Into<String>,
        amount: Decimal,
        occurred_on: NaiveDate,
    ) -> ResultLedger<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(LedgerError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "amount must be > 0, got {amount}"
            )));
        }
        Ok(Self {
            id,
            owner,
            description,
            amount,
            occurred_on,
        })
    }

    /// Normalizes a remote document, reading its timestamp in `tz`.
    pub fn from_remote(document: &RemoteDocument, tz: Tz) -> ResultLedger<Self> {
        let ExpenseFields {
            uid,
            description,
            value,
            date,
        } = &document.fields;
        let amount = amount::amount_from_f64(*value)?;
        let occurred_on = date.with_timezone(&tz).date_naive();
        Self::new(
            ExpenseId::new(document.id.clone()),
            OwnerId::new(uid.clone()),
            description.clone(),
            amount,
            occurred_on,
        )
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_on
    }

    /// ISO `YYYY-MM-DD` rendering used by the date filter.
    pub fn iso_date(&self) -> String {
        self.occurred_on.format("%Y-%m-%d").to_string()
    }
}

impl PartialEq for ExpenseRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExpenseRecord {}

impl Hash for ExpenseRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ExpenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.occurred_on.format("%d/%m/%Y"),
            self.description,
            amount::format_amount(self.amount)
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_blank_description() {
        let err = ExpenseRecord::new(
            ExpenseId::new("a"),
            OwnerId::new("u1"),
            "   ",
            Decimal::new(10, 0),
            date(2025, 1, 10),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in [Decimal::ZERO, Decimal::new(-5, 0)] {
            let err = ExpenseRecord::new(
                ExpenseId::new("a"),
                OwnerId::new("u1"),
                "Lunch",
                amount,
                date(2025, 1, 10),
            )
            .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
    }

    #[test]
    fn equality_is_by_id() {
        let a = ExpenseRecord::new(
            ExpenseId::new("a"),
            OwnerId::new("u1"),
            "Lunch",
            Decimal::new(10, 0),
            date(2025, 1, 10),
        )
        .unwrap();
        let a_edited = ExpenseRecord::new(
            ExpenseId::new("a"),
            OwnerId::new("u1"),
            "Dinner",
            Decimal::new(30, 0),
            date(2025, 1, 11),
        )
        .unwrap();
        assert_eq!(a, a_edited);
    }

    #[test]
    fn remote_timestamp_is_read_in_timezone() {
        let document = RemoteDocument {
            id: "doc-1".to_string(),
            fields: ExpenseFields {
                uid: "u1".to_string(),
                description: "Taxi".to_string(),
                value: 12.5,
                date: Utc.with_ymd_and_hms(2025, 5, 1, 1, 30, 0).unwrap(),
            },
        };

        let utc = ExpenseRecord::from_remote(&document, chrono_tz::UTC).unwrap();
        assert_eq!(utc.occurred_on(), date(2025, 5, 1));

        let sao_paulo =
            ExpenseRecord::from_remote(&document, chrono_tz::America::Sao_Paulo).unwrap();
        assert_eq!(sao_paulo.occurred_on(), date(2025, 4, 30));
        assert_eq!(sao_paulo.amount(), Decimal::new(125, 1));
        assert_eq!(sao_paulo.iso_date(), "2025-04-30");
    }

    #[test]
    fn remote_non_finite_value_is_rejected() {
        let document = RemoteDocument {
            id: "doc-1".to_string(),
            fields: ExpenseFields {
                uid: "u1".to_string(),
                description: "Taxi".to_string(),
                value: f64::NAN,
                date: Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap(),
            },
        };
        assert!(matches!(
            ExpenseRecord::from_remote(&document, chrono_tz::UTC),
            Err(LedgerError::Validation(_))
        ));
    }
}
