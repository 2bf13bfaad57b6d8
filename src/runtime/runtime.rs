//! Single-instance execution host
//!
//! Holds native-currency balances, the one deployed ledger, and applies
//! messages one at a time. A message either applies completely or not at all.

use crate::core::Address;
use crate::runtime::message::{Call, Message, Receipt};
use crate::token::{TokenError, TokenLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Runtime errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Token has not been deployed")]
    NotDeployed,
    #[error("Token already deployed at {0}")]
    AlreadyDeployed(Address),
    #[error("No contract at {0}")]
    NoContract(Address),
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },
    #[error("Native balance overflow")]
    Overflow,
    #[error("Ledger {0} cannot send native currency")]
    LedgerSender(Address),
}

/// The execution host
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Runtime {
    /// Native balances: account -> amount
    native: HashMap<Address, u128>,
    /// The deployed ledger, if any
    ledger: Option<TokenLedger>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy the ledger. Only one deployment is ever allowed.
    pub fn deploy(&mut self, deployer: Address) -> Result<Address, RuntimeError> {
        if let Some(ledger) = &self.ledger {
            return Err(RuntimeError::AlreadyDeployed(ledger.address()));
        }

        let address = Address::for_contract(&deployer, self.nonce);
        self.nonce += 1;

        // The address is predictable, so value may have been parked there
        // before deployment. The ledger never holds native currency.
        if let Some(burned) = self.native.remove(&address) {
            log::warn!("Burned {} native units pre-funded at {}", burned, address);
        }

        self.ledger = Some(TokenLedger::new(address, deployer));
        log::info!("Token deployed at {} by {}", address, deployer);

        Ok(address)
    }

    pub fn ledger(&self) -> Option<&TokenLedger> {
        self.ledger.as_ref()
    }

    /// The ledger, or `NotDeployed`
    pub fn token(&self) -> Result<&TokenLedger, RuntimeError> {
        self.ledger.as_ref().ok_or(RuntimeError::NotDeployed)
    }

    pub fn token_address(&self) -> Option<Address> {
        self.ledger.as_ref().map(|l| l.address())
    }

    /// Credit native currency to an account (dev faucet)
    pub fn fund(&mut self, account: Address, value: u128) -> Result<u128, RuntimeError> {
        if let Some(ledger) = self.ledger.as_ref().filter(|l| l.address() == account) {
            ledger.receive(&account, value)?;
        }

        let balance = self.native.entry(account).or_insert(0);
        *balance = balance.checked_add(value).ok_or(RuntimeError::Overflow)?;
        log::debug!("funded {} with {}", account, value);
        Ok(*balance)
    }

    pub fn native_balance(&self, account: &Address) -> u128 {
        self.native.get(account).copied().unwrap_or(0)
    }

    /// Apply one message
    pub fn execute(&mut self, message: Message) -> Result<Receipt, RuntimeError> {
        if Some(message.to) == self.token_address() {
            return self.execute_on_ledger(message);
        }

        if message.call.is_some() {
            return Err(RuntimeError::NoContract(message.to));
        }

        self.move_native(&message.from, &message.to, message.value)?;
        Ok(Receipt {
            success: true,
            events: Vec::new(),
        })
    }

    fn execute_on_ledger(&mut self, message: Message) -> Result<Receipt, RuntimeError> {
        let ledger = self.ledger.as_mut().ok_or(RuntimeError::NotDeployed)?;

        // Token entry points are non-payable and there is no receive hook.
        let call = match message.call {
            Some(call) if message.value == 0 => call,
            _ => {
                return ledger
                    .receive(&message.from, message.value)
                    .map(|()| Receipt {
                        success: false,
                        events: Vec::new(),
                    })
                    .map_err(Into::into);
            }
        };

        let caller = message.from;
        let before = ledger.events().len() as u64;

        let success = match &call {
            Call::Transfer { to, amount } => ledger.transfer(&caller, to, *amount)?,
            Call::Approve { spender, amount } => ledger.approve(&caller, spender, *amount),
            Call::TransferFrom { from, to, amount } => {
                ledger.transfer_from(&caller, from, to, *amount)?
            }
            Call::TransferOwnership { new_owner } => {
                ledger.transfer_ownership(&caller, new_owner)?;
                true
            }
            Call::RenounceOwnership => {
                ledger.renounce_ownership(&caller)?;
                true
            }
        };

        log::debug!("{} by {} executed", call.name(), caller);

        Ok(Receipt {
            success,
            events: ledger.events_since(before).to_vec(),
        })
    }

    fn move_native(&mut self, from: &Address, to: &Address, value: u128) -> Result<(), RuntimeError> {
        if Some(*from) == self.token_address() {
            return Err(RuntimeError::LedgerSender(*from));
        }

        let have = self.native_balance(from);
        if have < value {
            return Err(RuntimeError::InsufficientFunds { have, need: value });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .native_balance(to)
            .checked_add(value)
            .ok_or(RuntimeError::Overflow)?;

        self.native.insert(*from, have - value);
        self.native.insert(*to, credited);
        Ok(())
    }
}
