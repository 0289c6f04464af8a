//! REST API handlers for ledger operations

use crate::core::{Block, ChainSnapshot, SharedLedger, Transaction};
use crate::mining::{MineOutcome, Miner, MiningControl, MiningError};
use crate::network::{parse_node_address, ChainSync, NodeRegistry};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub ledger: SharedLedger,
    pub registry: Arc<RwLock<NodeRegistry>>,
    pub miner: Arc<Miner>,
    pub control: Arc<MiningControl>,
    pub chain_sync: Arc<ChainSync>,
}

type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub message: String,
    pub chain: Vec<Block>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

fn api_error(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNodesRequest {
    #[serde(default)]
    pub nodes: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Liveness check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /mine - Mine a block from the pending pool
pub async fn mine_block(State(state): State<ApiState>) -> ApiResult<MineResponse> {
    mine_response(state.miner.mine(&state.ledger, &state.control).await)
}

fn mine_response(outcome: Result<MineOutcome, MiningError>) -> ApiResult<MineResponse> {
    match outcome {
        Ok(MineOutcome::Mined { block, .. }) => Ok((
            StatusCode::OK,
            Json(MineResponse {
                message: "New Block Forged".to_string(),
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
            }),
        )),
        Ok(MineOutcome::Cancelled) | Ok(MineOutcome::Stale) => Err(api_error(
            StatusCode::CONFLICT,
            "Mining preempted by a chain update; retry",
        )),
        Err(e) => {
            log::error!("Mining failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Mining failed: {}", e),
            ))
        }
    }
}

/// POST /transactions/new - Queue a transaction for the next block
pub async fn new_transaction(
    State(state): State<ApiState>,
    Json(req): Json<NewTransactionRequest>,
) -> ApiResult<MessageResponse> {
    let index = state
        .ledger
        .write()
        .await
        .new_transaction(&req.sender, &req.recipient, req.amount);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {}", index),
        }),
    ))
}

/// GET /chain - Full chain with its length
pub async fn get_chain(State(state): State<ApiState>) -> Json<ChainSnapshot> {
    Json(state.ledger.read().await.snapshot())
}

/// POST /nodes/register - Add peer nodes
pub async fn register_nodes(
    State(state): State<ApiState>,
    Json(req): Json<RegisterNodesRequest>,
) -> ApiResult<RegisterResponse> {
    if req.nodes.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please supply a valid list of nodes",
        ));
    }

    // Reject the whole batch if any address is malformed
    for node in &req.nodes {
        parse_node_address(node).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    let mut registry = state.registry.write().await;
    for node in &req.nodes {
        registry
            .register_node(node)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: registry.nodes(),
        }),
    ))
}

/// GET /nodes/resolve - Run the consensus algorithm against all peers
pub async fn resolve_conflicts(State(state): State<ApiState>) -> Json<ResolveResponse> {
    let replaced = state.chain_sync.resolve_conflicts().await;
    let chain = state.ledger.read().await.chain().to_vec();

    Json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced".to_string()
        } else {
            "Our chain is authoritative".to_string()
        },
        chain,
    })
}
