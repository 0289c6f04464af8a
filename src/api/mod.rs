//! REST API module
//!
//! HTTP front-end over a node's ledger.
//!
//! # Endpoints
//!
//! ## Ledger
//! - `GET /chain` - Full chain and its length
//! - `POST /transactions/new` - Queue a transaction
//! - `GET /mine` - Mine a block from the pending pool
//!
//! ## Peers
//! - `POST /nodes/register` - Register peer nodes
//! - `GET /nodes/resolve` - Adopt the longest valid peer chain

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;
