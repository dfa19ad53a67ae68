//! Validation of the add/edit expense forms.

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::{
    LedgerError, OwnerId, ResultLedger,
    amount::{self, parse_amount},
    remote::ExpenseFields,
};

/// A validated expense as typed by the user, not yet written remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub occurred_on: NaiveDate,
}

impl ExpenseDraft {
    /// Validates the raw form fields.
    ///
    /// Every field is required, the value accepts `,` as decimal separator and
    /// must be positive, the date is `YYYY-MM-DD`.
    pub fn parse(description: &str, value: &str, date: &str) -> ResultLedger<Self> {
        let description = description.trim();
        if description.is_empty() || value.trim().is_empty() || date.trim().is_empty() {
            return Err(LedgerError::Validation("all fields are required".to_string()));
        }
        let amount = parse_amount(value)?;
        let occurred_on = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::Validation(format!("invalid date: {}", date.trim())))?;
        Self::new(description, amount, occurred_on)
    }

    pub fn new(
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
            description,
            amount,
            occurred_on,
        })
    }

    /// Remote document for `owner`.
    ///
    /// The date is stored as local midnight in `timezone`, so reading it back
    /// in the same timezone yields the same calendar day.
    pub fn to_fields(&self, owner: &OwnerId, timezone: Tz) -> ResultLedger<ExpenseFields> {
        let midnight = self.occurred_on.and_time(NaiveTime::MIN);
        let local = timezone
            .from_local_datetime(&midnight)
            .earliest()
            .ok_or_else(|| {
                LedgerError::Validation(format!(
                    "{} does not exist in {timezone}",
                    self.occurred_on
                ))
            })?;
        Ok(ExpenseFields {
            uid: owner.to_string(),
            description: self.description.clone(),
            value: amount::amount_to_f64(self.amount)?,
            date: local.to_utc(),
        })
    }
}
