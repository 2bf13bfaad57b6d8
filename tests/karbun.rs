//! End-to-end ledger scenarios driven through the runtime

use karbun::core::{Address, INITIAL_SUPPLY, ONE_TOKEN};
use karbun::runtime::{Call, Message, Runtime, RuntimeError};
use karbun::storage::{Storage, StorageConfig};
use karbun::token::{EventKind, TokenError};
use karbun::KeyPair;

struct Accounts {
    deployer: Address,
    provider: Address,
    user_a: Address,
    user_b: Address,
}

fn accounts() -> Accounts {
    Accounts {
        deployer: KeyPair::generate().address(),
        provider: KeyPair::generate().address(),
        user_a: KeyPair::generate().address(),
        user_b: KeyPair::generate().address(),
    }
}

fn deployed() -> (Runtime, Accounts, Address) {
    let accounts = accounts();
    let mut runtime = Runtime::new();
    let token = runtime.deploy(accounts.deployer).unwrap();
    (runtime, accounts, token)
}

fn transfer(runtime: &mut Runtime, token: Address, from: Address, to: Address, amount: u128) {
    let receipt = runtime
        .execute(Message::call(from, token, Call::Transfer { to, amount }))
        .unwrap();
    assert!(receipt.success);
}

fn balance(runtime: &Runtime, account: &Address) -> u128 {
    runtime.token().unwrap().balance_of(account)
}

#[test]
fn rejects_native_currency_sent_to_token() {
    let (mut runtime, accounts, token) = deployed();
    runtime.fund(accounts.deployer, 5 * ONE_TOKEN).unwrap();

    let result = runtime.execute(Message::send(accounts.deployer, token, 1));

    assert_eq!(
        result,
        Err(RuntimeError::Token(TokenError::NativeTransferRejected {
            value: 1
        }))
    );
    assert_eq!(runtime.native_balance(&accounts.deployer), 5 * ONE_TOKEN);
    assert_eq!(runtime.native_balance(&token), 0);
}

#[test]
fn initializes_token_metadata_and_supply() {
    let (runtime, accounts, _) = deployed();
    let ledger = runtime.token().unwrap();

    assert_eq!(ledger.name(), "Karbun");
    assert_eq!(ledger.symbol(), "KBC");
    assert_eq!(ledger.decimals(), 18);
    assert_eq!(ledger.total_supply(), 321_000_000 * ONE_TOKEN);
    assert_eq!(ledger.owner(), accounts.deployer);
    assert_eq!(ledger.balance_of(&accounts.deployer), INITIAL_SUPPLY);
}

#[test]
fn distributes_from_deployer() {
    let (mut runtime, accounts, token) = deployed();

    transfer(&mut runtime, token, accounts.deployer, accounts.provider, 10 * ONE_TOKEN);
    assert_eq!(balance(&runtime, &accounts.provider), 10 * ONE_TOKEN);

    transfer(&mut runtime, token, accounts.deployer, accounts.user_a, 100 * ONE_TOKEN);
    assert_eq!(balance(&runtime, &accounts.user_a), 100 * ONE_TOKEN);

    transfer(&mut runtime, token, accounts.deployer, accounts.user_b, 200 * ONE_TOKEN);
    assert_eq!(balance(&runtime, &accounts.user_b), 200 * ONE_TOKEN);

    assert_eq!(
        balance(&runtime, &accounts.deployer),
        INITIAL_SUPPLY - 310 * ONE_TOKEN
    );
    assert!(runtime.token().unwrap().check_supply_invariant());
}

#[test]
fn holder_transfers_back_to_deployer() {
    let (mut runtime, accounts, token) = deployed();
    transfer(&mut runtime, token, accounts.deployer, accounts.provider, 10 * ONE_TOKEN);

    transfer(&mut runtime, token, accounts.provider, accounts.deployer, ONE_TOKEN);

    assert_eq!(balance(&runtime, &accounts.provider), 9 * ONE_TOKEN);
    assert_eq!(
        balance(&runtime, &accounts.deployer),
        INITIAL_SUPPLY - 9 * ONE_TOKEN
    );
}

#[test]
fn failed_transfer_changes_nothing() {
    let (mut runtime, accounts, token) = deployed();
    transfer(&mut runtime, token, accounts.deployer, accounts.provider, 10 * ONE_TOKEN);
    let events_before = runtime.token().unwrap().events().len();

    let result = runtime.execute(Message::call(
        accounts.provider,
        token,
        Call::Transfer {
            to: accounts.user_a,
            amount: 11 * ONE_TOKEN,
        },
    ));

    assert!(matches!(
        result,
        Err(RuntimeError::Token(TokenError::InsufficientBalance { .. }))
    ));
    assert_eq!(balance(&runtime, &accounts.provider), 10 * ONE_TOKEN);
    assert_eq!(balance(&runtime, &accounts.user_a), 0);
    assert_eq!(runtime.token().unwrap().events().len(), events_before);
}

#[test]
fn delegated_transfer_spends_allowance() {
    let (mut runtime, accounts, token) = deployed();

    runtime
        .execute(Message::call(
            accounts.deployer,
            token,
            Call::Approve {
                spender: accounts.provider,
                amount: 50 * ONE_TOKEN,
            },
        ))
        .unwrap();

    let receipt = runtime
        .execute(Message::call(
            accounts.provider,
            token,
            Call::TransferFrom {
                from: accounts.deployer,
                to: accounts.user_a,
                amount: 20 * ONE_TOKEN,
            },
        ))
        .unwrap();

    assert_eq!(receipt.events.len(), 1);
    match &receipt.events[0].kind {
        EventKind::Transfer { from, to, amount } => {
            assert_eq!(*from, accounts.deployer);
            assert_eq!(*to, accounts.user_a);
            assert_eq!(*amount, 20 * ONE_TOKEN);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let ledger = runtime.token().unwrap();
    assert_eq!(ledger.balance_of(&accounts.user_a), 20 * ONE_TOKEN);
    assert_eq!(
        ledger.allowance(&accounts.deployer, &accounts.provider),
        30 * ONE_TOKEN
    );

    let overspend = runtime.execute(Message::call(
        accounts.provider,
        token,
        Call::TransferFrom {
            from: accounts.deployer,
            to: accounts.user_b,
            amount: 31 * ONE_TOKEN,
        },
    ));
    assert!(matches!(
        overspend,
        Err(RuntimeError::Token(TokenError::InsufficientAllowance { .. }))
    ));
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(StorageConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    })
    .unwrap();

    let (mut runtime, accounts, token) = deployed();
    transfer(&mut runtime, token, accounts.deployer, accounts.user_b, 200 * ONE_TOKEN);
    storage.save(&runtime).unwrap();

    let mut restored = storage.load().unwrap();
    assert_eq!(balance(&restored, &accounts.user_b), 200 * ONE_TOKEN);

    // Redeploying over a restored ledger is refused
    assert_eq!(
        restored.deploy(accounts.user_a),
        Err(RuntimeError::AlreadyDeployed(token))
    );
}
