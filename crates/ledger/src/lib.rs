//! Live filtered ledger of personal expenses.
//!
//! Remote changes flow through a [`ChangeFeed`] into a [`LedgerStore`];
//! [`project`] turns a store snapshot and a [`FilterSpec`] into the visible
//! list and its total. [`LiveLedger`] wires the three together for one owner.

pub use account::{profile, register, request_password_reset, sign_in, sign_out};
pub use amount::{format_amount, parse_amount};
pub use drafts::ExpenseDraft;
pub use error::LedgerError;
pub use expense::{ExpenseId, ExpenseRecord, OwnerId};
pub use feed::{ChangeFeed, FeedEvent};
pub use filter::{AmountPredicate, FilterSpec, Projection, project};
pub use live::LiveLedger;
pub use memory::{BatchWrite, MemoryBackend};
pub use store::LedgerStore;

pub mod account;
pub mod amount;
mod drafts;
mod error;
mod expense;
pub mod expenses;
mod feed;
mod filter;
mod live;
mod memory;
pub mod remote;
mod store;

pub type ResultLedger<T> = Result<T, LedgerError>;
