//! Filters and totals over a ledger snapshot.
//!
//! [`project`] is pure: the same records and [`FilterSpec`] always give the
//! same [`Projection`].

use rust_decimal::Decimal;

use crate::{ExpenseRecord, amount};

/// Comparison applied to the expense amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountPredicate {
    /// `>x` or `>=x`: amount greater than or equal to `x`.
    AtLeast(Decimal),
    /// `<x` or `<=x`: amount lower than or equal to `x`.
    AtMost(Decimal),
    /// Bare number, optionally prefixed by `=`.
    Equals(Decimal),
}

impl AmountPredicate {
    /// Parses the free-text amount filter.
    ///
    /// Only one comparison is honored: `>` anywhere in the text wins over `<`,
    /// which wins over equality. Blank or unparseable text gives `None`, the
    /// filter that matches every record.
    ///
    /// ```rust
    /// use ledger::AmountPredicate;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(
    ///     AmountPredicate::parse(">50"),
    ///     Some(AmountPredicate::AtLeast(Decimal::new(50, 0)))
    /// );
    /// assert_eq!(AmountPredicate::parse("abc"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let number: String = text
            .chars()
            .filter(|c| !matches!(c, '>' | '<' | '='))
            .collect();
        let value = match amount::parse_amount(&number) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("ignoring amount filter {text:?}: {err}");
                return None;
            }
        };

        Some(if text.contains('>') {
            Self::AtLeast(value)
        } else if text.contains('<') {
            Self::AtMost(value)
        } else {
            Self::Equals(value)
        })
    }

    pub fn matches(&self, amount: Decimal) -> bool {
        match *self {
            Self::AtLeast(bound) => amount >= bound,
            Self::AtMost(bound) => amount <= bound,
            Self::Equals(target) => amount == target,
        }
    }
}

/// User filters of the expense list. The default matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub amount: Option<AmountPredicate>,
    /// Substring of the `YYYY-MM-DD` date, e.g. `2025-05`.
    pub date: Option<String>,
}

impl FilterSpec {
    /// Builds a spec from the two text fields of the filter form.
    pub fn from_inputs(amount_text: &str, date_text: &str) -> Self {
        let date = date_text.trim();
        Self {
            amount: AmountPredicate::parse(amount_text),
            date: (!date.is_empty()).then(|| date.to_string()),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        self.amount.is_none() && self.date.is_none()
    }

    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        let amount_ok = self
            .amount
            .as_ref()
            .is_none_or(|predicate| predicate.matches(record.amount()));
        let date_ok = self
            .date
            .as_deref()
            .is_none_or(|date| record.iso_date().contains(date));
        amount_ok && date_ok
    }
}

/// Visible records and their total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pub visible: Vec<ExpenseRecord>,
    /// Sum of the visible amounts, rounded to two decimals.
    pub total: Decimal,
}

impl Projection {
    /// Total as a fixed-point string, e.g. `"120.00"`.
    pub fn total_display(&self) -> String {
        amount::format_amount(self.total)
    }
}

/// Keeps the records matching `spec`, in their input order, and sums them.
pub fn project(records: &[ExpenseRecord], spec: &FilterSpec) -> Projection {
    let visible: Vec<ExpenseRecord> = records
        .iter()
        .filter(|record| spec.matches(record))
        .cloned()
        .collect();
    let sum: Decimal = visible.iter().map(ExpenseRecord::amount).sum();
    Projection {
        visible,
        total: amount::round_amount(sum),
    }
}
