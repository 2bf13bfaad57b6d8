//! CLI commands for the Karbun ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::core::amount::{format_units, parse_units, DECIMALS};
use crate::core::Address;
use crate::crypto::KeyPair;
use crate::runtime::{Call, Message, Receipt, Runtime, RuntimeError};
use crate::storage::{Storage, StorageConfig};
use crate::token::{EventKind, LedgerEvent, TokenLedger};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub runtime: Runtime,
    pub storage: Storage,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        let runtime = if storage.exists() {
            storage.load()?
        } else {
            println!("🆕 No ledger found, starting empty state (run `karbun init`)");
            Runtime::new()
        };

        Ok(Self { runtime, storage })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.runtime)?;
        Ok(())
    }

    fn ledger(&self) -> CliResult<&TokenLedger> {
        Ok(self.runtime.token()?)
    }

    /// Execute a ledger call from `caller` and persist the result
    fn call(&mut self, caller: Address, call: Call) -> CliResult<Receipt> {
        let token = self.ledger()?.address();
        let receipt = self.runtime.execute(Message::call(caller, token, call))?;
        self.save()?;
        Ok(receipt)
    }
}

/// Storage configuration rooted at `data_dir`
pub fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

fn parse_address(value: &str) -> CliResult<Address> {
    Ok(value.parse()?)
}

fn parse_tokens(value: &str) -> CliResult<u128> {
    Ok(parse_units(value, DECIMALS)?)
}

fn tokens(value: u128) -> String {
    format!("{} KBC", format_units(value, DECIMALS))
}

fn describe_event(event: &LedgerEvent) -> String {
    match &event.kind {
        EventKind::Transfer { from, to, amount } => {
            format!("Transfer {} -> {}: {}", from, to, tokens(*amount))
        }
        EventKind::Approval {
            owner,
            spender,
            amount,
        } => format!("Approval {} -> {}: {}", owner, spender, tokens(*amount)),
        EventKind::OwnershipTransferred { previous, new } => {
            format!("OwnershipTransferred {} -> {}", previous, new)
        }
    }
}

fn print_receipt(receipt: &Receipt) {
    for event in &receipt.events {
        println!("   └─ #{} {}", event.seq, describe_event(event));
    }
}

/// Deploy the ledger
pub fn cmd_init(data_dir: &Path, deployer: Option<&str>) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    // Native balances funded before init are kept
    let mut runtime = if storage.exists() {
        storage.load()?
    } else {
        Runtime::new()
    };
    if let Some(address) = runtime.token_address() {
        println!("⚠️  Ledger already exists at {:?}", storage.data_dir());
        return Err(RuntimeError::AlreadyDeployed(address).into());
    }

    let deployer = match deployer {
        Some(address) => parse_address(address)?,
        None => {
            let key_pair = KeyPair::generate();
            println!("🔐 Generated deployer account");
            println!("   🔑 Private key: {}", key_pair.private_key_hex());
            println!("   ⚠️  Keep this key safe, it controls the entire supply!");
            key_pair.address()
        }
    };

    let address = runtime.deploy(deployer)?;
    storage.save(&runtime)?;

    let ledger = runtime.token()?;
    println!("✅ {} ({}) deployed!", ledger.name(), ledger.symbol());
    println!("   📁 Data directory: {:?}", storage.data_dir());
    println!("   📍 Token address: {}", address);
    println!("   👤 Owner: {}", ledger.owner());
    println!("   💰 Total supply: {}", tokens(ledger.total_supply()));

    Ok(())
}

/// Display token info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = state.ledger()?;

    println!("🪙  Token Info");
    println!("   ├─ Name: {}", ledger.name());
    println!("   ├─ Symbol: {}", ledger.symbol());
    println!("   ├─ Decimals: {}", ledger.decimals());
    println!("   ├─ Address: {}", ledger.address());
    println!("   ├─ Owner: {}", ledger.owner());
    println!("   ├─ Total supply: {}", tokens(ledger.total_supply()));
    println!("   ├─ Holders: {}", ledger.holder_count());
    println!("   └─ Events: {}", ledger.events().len());

    Ok(())
}

/// Show token and native balance of an account
pub fn cmd_balance(state: &AppState, address: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    let ledger = state.ledger()?;

    println!("💰 Balance for {}", address);
    println!("   ├─ Token: {}", tokens(ledger.balance_of(&address)));
    println!(
        "   └─ Native: {}",
        format_units(state.runtime.native_balance(&address), DECIMALS)
    );

    Ok(())
}

/// List the largest holders
pub fn cmd_holders(state: &AppState, count: usize) -> CliResult<()> {
    let ledger = state.ledger()?;
    let holders = ledger.holders();

    println!("📋 Holders ({}):", holders.len());
    for (address, balance) in holders.iter().take(count) {
        println!("   {} - {}", address, tokens(*balance));
    }
    if holders.len() > count {
        println!("   ... and {} more", holders.len() - count);
    }

    Ok(())
}

/// Transfer tokens
pub fn cmd_transfer(state: &mut AppState, from: &str, to: &str, amount: &str) -> CliResult<()> {
    let from = parse_address(from)?;
    let to = parse_address(to)?;
    let amount = parse_tokens(amount)?;

    let receipt = state.call(from, Call::Transfer { to, amount })?;

    println!("✅ Transferred {} from {} to {}", tokens(amount), from, to);
    print_receipt(&receipt);

    Ok(())
}

/// Approve a spender
pub fn cmd_approve(
    state: &mut AppState,
    owner: &str,
    spender: &str,
    amount: &str,
) -> CliResult<()> {
    let owner = parse_address(owner)?;
    let spender = parse_address(spender)?;
    let amount = parse_tokens(amount)?;

    let receipt = state.call(owner, Call::Approve { spender, amount })?;

    println!("✅ {} may spend {} of {}'s tokens", spender, tokens(amount), owner);
    print_receipt(&receipt);

    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(state: &AppState, owner: &str, spender: &str) -> CliResult<()> {
    let owner = parse_address(owner)?;
    let spender = parse_address(spender)?;
    let ledger = state.ledger()?;

    println!(
        "🔏 Allowance {} -> {}: {}",
        owner,
        spender,
        tokens(ledger.allowance(&owner, &spender))
    );

    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    spender: &str,
    from: &str,
    to: &str,
    amount: &str,
) -> CliResult<()> {
    let spender = parse_address(spender)?;
    let from = parse_address(from)?;
    let to = parse_address(to)?;
    let amount = parse_tokens(amount)?;

    let receipt = state.call(spender, Call::TransferFrom { from, to, amount })?;

    println!(
        "✅ {} moved {} from {} to {}",
        spender,
        tokens(amount),
        from,
        to
    );
    print_receipt(&receipt);

    Ok(())
}

/// Transfer or renounce ownership
pub fn cmd_ownership(state: &mut AppState, caller: &str, new_owner: Option<&str>) -> CliResult<()> {
    let caller = parse_address(caller)?;
    let call = match new_owner {
        Some(address) => Call::TransferOwnership {
            new_owner: parse_address(address)?,
        },
        None => Call::RenounceOwnership,
    };

    let receipt = state.call(caller, call)?;

    println!("👤 Owner is now {}", state.ledger()?.owner());
    print_receipt(&receipt);

    Ok(())
}

/// Send native currency
pub fn cmd_send(state: &mut AppState, from: &str, to: &str, value: &str) -> CliResult<()> {
    let from = parse_address(from)?;
    let to = parse_address(to)?;
    let value = parse_tokens(value)?;

    state.runtime.execute(Message::send(from, to, value))?;
    state.save()?;

    println!(
        "📤 Sent {} native from {} to {}",
        format_units(value, DECIMALS),
        from,
        to
    );

    Ok(())
}

/// Credit native currency to an account
pub fn cmd_fund(state: &mut AppState, address: &str, value: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    let value = parse_tokens(value)?;

    let balance = state.runtime.fund(address, value)?;
    state.save()?;

    println!(
        "🚰 Funded {} - native balance now {}",
        address,
        format_units(balance, DECIMALS)
    );

    Ok(())
}

/// Show recent events
pub fn cmd_events(state: &AppState, count: usize) -> CliResult<()> {
    let ledger = state.ledger()?;
    let events = ledger.events().latest(count);

    println!("📜 Events ({} of {}):", events.len(), ledger.events().len());
    for event in events {
        println!(
            "   #{} {} | {}",
            event.seq,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            describe_event(event)
        );
    }

    Ok(())
}

/// Generate a new account
pub fn cmd_account_new() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New account created!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Public Key: {}", key_pair.public_key_hex());
    println!("   🔑 Private Key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere. Save it now!");

    Ok(())
}

/// Show the address belonging to a private key
pub fn cmd_account_show(private_key: &str) -> CliResult<()> {
    let key_pair = KeyPair::from_private_key_hex(private_key)?;
    println!("📍 Address: {}", key_pair.address());
    Ok(())
}

/// Export state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.runtime, path)?;
    println!("📦 State exported to {:?}", path);
    Ok(())
}

/// Import state from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    state.runtime = crate::storage::load_from_file(path)?;
    state.save()?;

    println!("📥 State imported from {:?}", path);
    if let Some(address) = state.runtime.token_address() {
        println!("   Token address: {}", address);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::{INITIAL_SUPPLY, ONE_TOKEN};

    fn deployer() -> Address {
        Address::new([0xd0; 20])
    }

    fn initialized(dir: &tempfile::TempDir) -> AppState {
        let deployer = deployer().to_string();
        cmd_init(dir.path(), Some(&deployer)).unwrap();
        AppState::new(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_init_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state = initialized(&dir);

        let ledger = state.runtime.token().unwrap();
        assert_eq!(ledger.owner(), deployer());
        assert_eq!(ledger.balance_of(&deployer()), INITIAL_SUPPLY);

        // Second init fails and leaves the existing ledger alone
        let err = cmd_init(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("already deployed"));
        let again = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(again.runtime.token().unwrap().owner(), deployer());
    }

    #[test]
    fn test_init_after_fund_deploys() {
        let dir = tempfile::tempdir().unwrap();
        let user = Address::new([4; 20]);

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_fund(&mut state, &user.to_string(), "2").unwrap();

        cmd_init(dir.path(), Some(&deployer().to_string())).unwrap();

        let reloaded = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.runtime.token().unwrap().owner(), deployer());
        assert_eq!(reloaded.runtime.native_balance(&user), 2 * ONE_TOKEN);
    }

    #[test]
    fn test_transfer_in_whole_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = initialized(&dir);
        let recipient = Address::new([1; 20]).to_string();

        cmd_transfer(&mut state, &deployer().to_string(), &recipient, "10").unwrap();

        let reloaded = AppState::new(dir.path().to_path_buf()).unwrap();
        let ledger = reloaded.runtime.token().unwrap();
        assert_eq!(
            ledger.balance_of(&Address::new([1; 20])),
            10 * ONE_TOKEN
        );
    }

    #[test]
    fn test_transfer_rejected_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = initialized(&dir);
        let stranger = Address::new([2; 20]).to_string();

        let result = cmd_transfer(&mut state, &stranger, &deployer().to_string(), "1");
        assert!(result.is_err());
        assert_eq!(
            state.runtime.token().unwrap().balance_of(&deployer()),
            INITIAL_SUPPLY
        );
    }

    #[test]
    fn test_send_native_to_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = initialized(&dir);
        let user = Address::new([3; 20]).to_string();
        let token = state.runtime.token_address().unwrap().to_string();

        cmd_fund(&mut state, &user, "1").unwrap();
        assert!(cmd_send(&mut state, &user, &token, "0.000000000000000001").is_err());
        assert_eq!(
            state.runtime.native_balance(&Address::new([3; 20])),
            ONE_TOKEN
        );
    }

    #[test]
    fn test_commands_without_ledger_fail() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert!(cmd_info(&state).is_err());
    }

    #[test]
    fn test_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = initialized(&dir);
        let export = dir.path().join("export.json");

        cmd_export(&state, &export).unwrap();
        state.runtime = Runtime::new();
        cmd_import(&mut state, &export).unwrap();

        assert!(state.runtime.token().is_ok());
    }
}
