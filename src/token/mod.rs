//! Karbun fungible token
//!
//! Provides the token ledger with:
//! - Balances per address, fixed total supply minted to the deployer
//! - Allowances for delegated transfers
//! - An owner role with transfer/renounce
//! - An append-only event log
//!
//! # Example
//!
//! ```
//! use karbun::core::{amount::ONE_TOKEN, Address};
//! use karbun::token::TokenLedger;
//!
//! let deployer = Address::new([1; 20]);
//! let recipient = Address::new([2; 20]);
//! let mut ledger = TokenLedger::new(Address::new([9; 20]), deployer);
//!
//! ledger.transfer(&deployer, &recipient, 10 * ONE_TOKEN).unwrap();
//! assert_eq!(ledger.balance_of(&recipient), 10 * ONE_TOKEN);
//! ```

pub mod events;
pub mod ledger;

pub use events::{EventKind, EventLog, LedgerEvent};
pub use ledger::{TokenError, TokenLedger, TokenMetadata, TOKEN_NAME, TOKEN_SYMBOL};
