//! Execution host for the ledger
//!
//! Plays the part of the platform: assigns the ledger its address, keeps
//! native-currency balances, and applies messages in a single total order.

pub mod message;
pub mod runtime;

pub use message::{Call, Message, Receipt};
pub use runtime::{Runtime, RuntimeError};
