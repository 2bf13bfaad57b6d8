//! Messages submitted to the runtime

use crate::core::Address;
use crate::token::LedgerEvent;
use serde::{Deserialize, Serialize};

/// A ledger entry point. The caller is always the message sender.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Call {
    Transfer {
        to: Address,
        amount: u128,
    },
    Approve {
        spender: Address,
        amount: u128,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: u128,
    },
    TransferOwnership {
        new_owner: Address,
    },
    RenounceOwnership,
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transferFrom",
            Call::TransferOwnership { .. } => "transferOwnership",
            Call::RenounceOwnership => "renounceOwnership",
        }
    }
}

/// A message from `from` to `to`, optionally carrying native value and a call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub from: Address,
    pub to: Address,
    /// Attached native currency, in smallest units
    pub value: u128,
    pub call: Option<Call>,
}

impl Message {
    /// A ledger call with no value attached
    pub fn call(from: Address, to: Address, call: Call) -> Self {
        Self {
            from,
            to,
            value: 0,
            call: Some(call),
        }
    }

    /// A plain native-currency send
    pub fn send(from: Address, to: Address, value: u128) -> Self {
        Self {
            from,
            to,
            value,
            call: None,
        }
    }

    /// Attach native value
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Result of a successfully executed message
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    /// Boolean returned by the ledger entry point (true for plain sends)
    pub success: bool,
    /// Events appended while executing this message
    pub events: Vec<LedgerEvent>,
}
