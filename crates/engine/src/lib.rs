//! The ledger transaction engine.
//!
//! The engine moves money between accounts as atomic, double-entry units of
//! work against a relational store. It exposes three composite operations:
//!
//! - [`Engine::open_account`]: create a `bank` account together with its
//!   paired `external` settlement account.
//! - [`Engine::transfer`]: move funds between two accounts, producing one
//!   [`Transfer`] record and two balancing [`Entry`] rows.
//! - [`Engine::deposit`]: move funds from a user's settlement account into
//!   their bank account.
//!
//! All three run through the same transaction executor and, where two
//! accounts are mutated together, through the same ascending-id lock order.
//! HTTP routing, authentication and input decoding live outside this crate.

pub use accounts::{Account, AccountKind};
pub use commands::{DepositCmd, OpenAccountCmd, TransferCmd};
pub use currency::Currency;
pub use entries::Entry;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use transfers::{Transfer, TransferOutcome};

pub mod accounts;
mod commands;
mod currency;
pub mod entries;
mod error;
mod ops;
pub mod store;
pub mod transfers;
pub mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
