//! Core ledger primitives
//!
//! - Addresses (20-byte account and contract identifiers)
//! - Amounts (18-decimal fixed point, supply constants, unit parsing)

pub mod address;
pub mod amount;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use amount::{format_units, parse_units, AmountError, DECIMALS, INITIAL_SUPPLY, ONE_TOKEN};
