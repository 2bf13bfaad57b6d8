//! REST API module
//!
//! Provides HTTP access to the ledger. Amounts are base-10 strings in
//! smallest units; addresses are `0x`-prefixed hex.
//!
//! # Endpoints
//!
//! ## Token
//! - `GET /api/token` - Name, symbol, decimals, supply, owner
//! - `GET /api/token/balance/{holder}` - Balance of an account
//! - `GET /api/token/allowance?owner=&spender=` - Allowance
//! - `GET /api/token/events?since=` - Event log
//! - `POST /api/token/transfer` - Transfer tokens
//! - `POST /api/token/approve` - Approve spender
//! - `POST /api/token/transferFrom` - Delegated transfer
//! - `POST /api/token/ownership` - Transfer or renounce ownership
//!
//! ## Native currency
//! - `POST /api/send` - Send native currency (rejected when sent to the token)
//! - `GET /api/accounts/{address}` - Native and token balance

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}
