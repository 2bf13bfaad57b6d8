//! REST API handlers for ledger operations

use crate::core::Address;
use crate::runtime::{Call, Message, Receipt, Runtime, RuntimeError};
use crate::storage::Storage;
use crate::token::{EventKind, LedgerEvent, TokenError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<RwLock<Runtime>>,
    pub storage: Arc<Storage>,
}

impl ApiState {
    pub fn new(runtime: Runtime, storage: Storage) -> Self {
        Self {
            runtime: Arc::new(RwLock::new(runtime)),
            storage: Arc::new(storage),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Token info response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub owner: String,
    pub holder_count: usize,
}

/// Token balance response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenBalanceResponse {
    pub holder: String,
    pub balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: String,
    pub spender: String,
    pub allowance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: String,
    pub native_balance: String,
    pub token_balance: String,
}

/// Event payload with amounts as base-10 strings
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum EventKindResponse {
    Transfer {
        from: String,
        to: String,
        amount: String,
    },
    Approval {
        owner: String,
        spender: String,
        amount: String,
    },
    OwnershipTransferred {
        previous: String,
        new: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub seq: u64,
    pub kind: EventKindResponse,
    pub timestamp: String,
}

impl From<&LedgerEvent> for EventResponse {
    fn from(event: &LedgerEvent) -> Self {
        let kind = match &event.kind {
            EventKind::Transfer { from, to, amount } => EventKindResponse::Transfer {
                from: from.to_string(),
                to: to.to_string(),
                amount: amount.to_string(),
            },
            EventKind::Approval {
                owner,
                spender,
                amount,
            } => EventKindResponse::Approval {
                owner: owner.to_string(),
                spender: spender.to_string(),
                amount: amount.to_string(),
            },
            EventKind::OwnershipTransferred { previous, new } => {
                EventKindResponse::OwnershipTransferred {
                    previous: previous.to_string(),
                    new: new.to_string(),
                }
            }
        };

        Self {
            seq: event.seq,
            kind,
            timestamp: event.timestamp.to_rfc3339(),
        }
    }
}

/// Result of a submitted message
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub success: bool,
    pub events: Vec<EventResponse>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            success: receipt.success,
            events: receipt.events.iter().map(EventResponse::from).collect(),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub owner: String,
    pub spender: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct TransferFromRequest {
    pub spender: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

/// Ownership change; an absent `new_owner` renounces
#[derive(Deserialize)]
pub struct OwnershipRequest {
    pub caller: String,
    pub new_owner: Option<String>,
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct AllowanceQuery {
    pub owner: String,
    pub spender: String,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub since: Option<u64>,
}

// ============================================================================
// Helpers
// ============================================================================

fn bad_request(error: String) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error }))
}

fn parse_address(field: &str, value: &str) -> Result<Address, (StatusCode, Json<ApiError>)> {
    value
        .parse()
        .map_err(|e| bad_request(format!("Invalid {}: {}", field, e)))
}

fn parse_amount(field: &str, value: &str) -> Result<u128, (StatusCode, Json<ApiError>)> {
    value
        .parse()
        .map_err(|_| bad_request(format!("Invalid {}: must be a base-10 integer", field)))
}

fn runtime_error(error: RuntimeError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        RuntimeError::NotDeployed => StatusCode::NOT_FOUND,
        RuntimeError::Token(TokenError::NotOwner(_)) => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

fn internal_error(error: String) -> (StatusCode, Json<ApiError>) {
    log::error!("{}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError { error }))
}

/// Write a candidate state to disk off the async workers, handing it back
/// once it is durable
async fn persist(
    storage: Arc<Storage>,
    runtime: Runtime,
) -> Result<Runtime, (StatusCode, Json<ApiError>)> {
    tokio::task::spawn_blocking(move || storage.save(&runtime).map(|()| runtime))
        .await
        .map_err(|e| internal_error(format!("Persistence task failed: {}", e)))?
        .map_err(|e| internal_error(format!("Failed to persist state: {}", e)))
}

/// Execute a message against a copy of the runtime and install the copy
/// only after it has been saved. The write lock is held throughout, so
/// messages still apply in a single order.
async fn commit(
    state: &ApiState,
    build: impl FnOnce(&Runtime) -> Result<Message, RuntimeError>,
) -> ApiResult<ReceiptResponse> {
    let mut runtime = state.runtime.write().await;

    let mut next = runtime.clone();
    let message = build(&next).map_err(runtime_error)?;
    let receipt = next.execute(message).map_err(runtime_error)?;

    *runtime = persist(state.storage.clone(), next).await?;

    Ok(Json(receipt.into()))
}

/// Execute a ledger call
async fn submit(
    state: &ApiState,
    build: impl FnOnce(Address) -> Message,
) -> ApiResult<ReceiptResponse> {
    commit(state, |runtime| Ok(build(runtime.token()?.address()))).await
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/token - Token info
pub async fn get_token(State(state): State<ApiState>) -> ApiResult<TokenInfo> {
    let runtime = state.runtime.read().await;
    let ledger = runtime.token().map_err(runtime_error)?;

    Ok(Json(TokenInfo {
        address: ledger.address().to_string(),
        name: ledger.name().to_string(),
        symbol: ledger.symbol().to_string(),
        decimals: ledger.decimals(),
        total_supply: ledger.total_supply().to_string(),
        owner: ledger.owner().to_string(),
        holder_count: ledger.holder_count(),
    }))
}

/// GET /api/token/balance/{holder} - Token balance
pub async fn get_token_balance(
    State(state): State<ApiState>,
    Path(holder): Path<String>,
) -> ApiResult<TokenBalanceResponse> {
    let holder = parse_address("holder", &holder)?;
    let runtime = state.runtime.read().await;
    let ledger = runtime.token().map_err(runtime_error)?;

    Ok(Json(TokenBalanceResponse {
        holder: holder.to_string(),
        balance: ledger.balance_of(&holder).to_string(),
    }))
}

/// GET /api/token/allowance?owner=&spender= - Allowance
pub async fn get_token_allowance(
    State(state): State<ApiState>,
    Query(query): Query<AllowanceQuery>,
) -> ApiResult<AllowanceResponse> {
    let owner = parse_address("owner", &query.owner)?;
    let spender = parse_address("spender", &query.spender)?;
    let runtime = state.runtime.read().await;
    let ledger = runtime.token().map_err(runtime_error)?;

    Ok(Json(AllowanceResponse {
        owner: owner.to_string(),
        spender: spender.to_string(),
        allowance: ledger.allowance(&owner, &spender).to_string(),
    }))
}

/// GET /api/token/events?since= - Event log
pub async fn get_token_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Vec<EventResponse>> {
    let runtime = state.runtime.read().await;
    let ledger = runtime.token().map_err(runtime_error)?;

    Ok(Json(
        ledger
            .events_since(query.since.unwrap_or(0))
            .iter()
            .map(EventResponse::from)
            .collect(),
    ))
}

/// POST /api/token/transfer - Transfer tokens
pub async fn transfer_tokens(
    State(state): State<ApiState>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<ReceiptResponse> {
    let from = parse_address("from", &req.from)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount("amount", &req.amount)?;

    submit(&state, |token| {
        Message::call(from, token, Call::Transfer { to, amount })
    })
    .await
}

/// POST /api/token/approve - Approve spender
pub async fn approve_tokens(
    State(state): State<ApiState>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<ReceiptResponse> {
    let owner = parse_address("owner", &req.owner)?;
    let spender = parse_address("spender", &req.spender)?;
    let amount = parse_amount("amount", &req.amount)?;

    submit(&state, |token| {
        Message::call(owner, token, Call::Approve { spender, amount })
    })
    .await
}

/// POST /api/token/transferFrom - Delegated transfer
pub async fn transfer_from_tokens(
    State(state): State<ApiState>,
    Json(req): Json<TransferFromRequest>,
) -> ApiResult<ReceiptResponse> {
    let spender = parse_address("spender", &req.spender)?;
    let from = parse_address("from", &req.from)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount("amount", &req.amount)?;

    submit(&state, |token| {
        Message::call(spender, token, Call::TransferFrom { from, to, amount })
    })
    .await
}

/// POST /api/token/ownership - Transfer or renounce ownership
pub async fn change_ownership(
    State(state): State<ApiState>,
    Json(req): Json<OwnershipRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let call = match req.new_owner {
        Some(new_owner) => Call::TransferOwnership {
            new_owner: parse_address("new_owner", &new_owner)?,
        },
        None => Call::RenounceOwnership,
    };

    submit(&state, |token| Message::call(caller, token, call)).await
}

/// POST /api/send - Native currency send
pub async fn send_native(
    State(state): State<ApiState>,
    Json(req): Json<SendRequest>,
) -> ApiResult<ReceiptResponse> {
    let from = parse_address("from", &req.from)?;
    let to = parse_address("to", &req.to)?;
    let value = parse_amount("value", &req.value)?;

    commit(&state, |_| Ok(Message::send(from, to, value))).await
}

/// GET /api/accounts/{address} - Native and token balance
pub async fn get_account(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<AccountResponse> {
    let address = parse_address("address", &address)?;
    let runtime = state.runtime.read().await;

    let token_balance = runtime
        .ledger()
        .map(|ledger| ledger.balance_of(&address))
        .unwrap_or(0);

    Ok(Json(AccountResponse {
        address: address.to_string(),
        native_balance: runtime.native_balance(&address).to_string(),
        token_balance: token_balance.to_string(),
    }))
}
