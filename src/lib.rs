//! Karbun: a fixed-supply fungible token ledger in Rust
//!
//! This crate provides:
//! - The Karbun (KBC) token ledger: 18 decimals, 321,000,000 tokens minted
//!   once to the deployer
//! - Transfers, allowances and delegated transfers with an event log
//! - An owner role that can be transferred or renounced
//! - A runtime that hosts the ledger, tracks native currency, and rejects
//!   native value sent to the ledger
//! - JSON persistence with backups
//! - A REST API and CLI
//!
//! # Example
//!
//! ```rust
//! use karbun::core::{Address, ONE_TOKEN};
//! use karbun::runtime::{Call, Message, Runtime};
//!
//! let mut runtime = Runtime::new();
//! let deployer = Address::new([1; 20]);
//! let provider = Address::new([2; 20]);
//! let token = runtime.deploy(deployer).unwrap();
//!
//! let transfer = Call::Transfer { to: provider, amount: 10 * ONE_TOKEN };
//! runtime.execute(Message::call(deployer, token, transfer)).unwrap();
//!
//! assert_eq!(runtime.token().unwrap().balance_of(&provider), 10 * ONE_TOKEN);
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod runtime;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use api::{create_router, ApiConfig, ApiState};
pub use core::{Address, DECIMALS, INITIAL_SUPPLY, ONE_TOKEN};
pub use crypto::KeyPair;
pub use runtime::{Call, Message, Receipt, Runtime, RuntimeError};
pub use storage::{Storage, StorageConfig};
pub use token::{TokenError, TokenLedger, TokenMetadata};
