//! Karbun token ledger
//!
//! Fixed-supply fungible token with balances, allowances and an owner role.
//! Every mutating operation validates all of its preconditions before it
//! touches state, so a failed call leaves the ledger exactly as it was.

use crate::core::amount::{DECIMALS, INITIAL_SUPPLY};
use crate::core::Address;
use crate::token::events::{EventKind, EventLog, LedgerEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Token name
pub const TOKEN_NAME: &str = "Karbun";

/// Token symbol
pub const TOKEN_SYMBOL: &str = "KBC";

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(Address),
    #[error("Native currency transfer rejected (value {value})")]
    NativeTransferRejected { value: u128 },
    #[error("Caller is not the owner: {0}")]
    NotOwner(Address),
    #[error("Invalid owner: the zero address cannot own the token")]
    InvalidOwner,
}

/// Token metadata (immutable after construction)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: DECIMALS,
        }
    }
}

/// The token ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Address the ledger is deployed at
    address: Address,
    metadata: TokenMetadata,
    total_supply: u128,
    owner: Address,
    /// Balances: holder -> amount
    balances: HashMap<Address, u128>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, u128>>,
    events: EventLog,
}

impl TokenLedger {
    /// Construct the ledger, minting the whole supply to `deployer`
    pub fn new(address: Address, deployer: Address) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer, INITIAL_SUPPLY);

        let mut events = EventLog::new();
        events.record(EventKind::Transfer {
            from: Address::ZERO,
            to: deployer,
            amount: INITIAL_SUPPLY,
        });

        log::info!(
            "{} ({}) constructed at {}, {} units minted to {}",
            TOKEN_NAME,
            TOKEN_SYMBOL,
            address,
            INITIAL_SUPPLY,
            deployer
        );

        Self {
            address,
            metadata: TokenMetadata::default(),
            total_supply: INITIAL_SUPPLY,
            owner: deployer,
            balances,
            allowances: HashMap::new(),
            events,
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Current owner (zero after renouncing)
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Balance of an account (0 if never seen)
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Remaining amount `spender` may move on behalf of `owner`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> Vec<(Address, u128)> {
        let mut holders: Vec<(Address, u128)> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, &b)| (*a, b))
            .collect();
        holders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Events with sequence number `>= seq`
    pub fn events_since(&self, seq: u64) -> &[LedgerEvent] {
        self.events.since(seq)
    }

    /// Sum of balances equals total supply
    pub fn check_supply_invariant(&self) -> bool {
        let mut sum: u128 = 0;
        for balance in self.balances.values() {
            match sum.checked_add(*balance) {
                Some(s) => sum = s,
                None => return false,
            }
        }
        sum == self.total_supply
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Move `amount` from `caller` to `to`
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<bool, TokenError> {
        self.ensure_recipient(to)?;
        self.ensure_balance(caller, amount)?;

        self.move_balance(caller, to, amount);
        Ok(true)
    }

    /// Set the allowance of `spender` over `caller`'s tokens
    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: u128) -> bool {
        self.allowances
            .entry(*caller)
            .or_default()
            .insert(*spender, amount);

        self.events.record(EventKind::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        });
        log::debug!("approve {} -> {}: {}", caller, spender, amount);

        true
    }

    /// Move `amount` from `from` to `to` using `caller`'s allowance
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<bool, TokenError> {
        let current = self.allowance(from, caller);
        if current < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current,
                need: amount,
            });
        }
        self.ensure_recipient(to)?;
        self.ensure_balance(from, amount)?;

        // All checks passed; from here on nothing can fail.
        self.allowances
            .entry(*from)
            .or_default()
            .insert(*caller, current - amount);

        self.move_balance(from, to, amount);
        Ok(true)
    }

    /// Hand the owner role to `new_owner`
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<(), TokenError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::InvalidOwner);
        }

        self.set_owner(*new_owner);
        Ok(())
    }

    /// Give up the owner role for good
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<(), TokenError> {
        self.ensure_owner(caller)?;
        self.set_owner(Address::ZERO);
        Ok(())
    }

    /// Native currency sent to the ledger. Always rejected.
    pub fn receive(&self, caller: &Address, value: u128) -> Result<(), TokenError> {
        log::warn!(
            "Rejected native transfer of {} from {} to ledger {}",
            value,
            caller,
            self.address
        );
        Err(TokenError::NativeTransferRejected { value })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_recipient(&self, to: &Address) -> Result<(), TokenError> {
        if to.is_zero() || *to == self.address {
            return Err(TokenError::InvalidRecipient(*to));
        }
        Ok(())
    }

    fn ensure_balance(&self, account: &Address, amount: u128) -> Result<(), TokenError> {
        let have = self.balance_of(account);
        if have < amount {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if self.owner.is_zero() || *caller != self.owner {
            return Err(TokenError::NotOwner(*caller));
        }
        Ok(())
    }

    fn set_owner(&mut self, new: Address) {
        let previous = self.owner;
        self.owner = new;
        self.events
            .record(EventKind::OwnershipTransferred { previous, new });
        log::info!("Ownership transferred: {} -> {}", previous, new);
    }

    /// Balance move; caller has checked `balance[from] >= amount`.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) {
        *self.balances.entry(*from).or_insert(0) -= amount;
        // Cannot overflow: every balance is bounded by total supply.
        *self.balances.entry(*to).or_insert(0) += amount;

        self.events.record(EventKind::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        log::debug!("transfer {} -> {}: {}", from, to, amount);
    }
}
