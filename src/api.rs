//! HTTP API for a HashLedger node
//!
//! Thin translation layer: every route forwards to [`Node`] and maps
//! [`ChainError`] onto status codes. `GET /chain` doubles as the peer
//! exchange endpoint read by [`crate::network::HttpPeerNetwork`].

use axum::{
    extract::{Form, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::crypto::KeyPair;
use crate::error::ChainError;
use crate::network::ChainResponse;
use crate::node::Node;

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(e) => {
                let status = match &e {
                    ChainError::InvalidTransactionSignature => StatusCode::NOT_ACCEPTABLE,
                    ChainError::InvalidNodeAddress(_) => StatusCode::BAD_REQUEST,
                    ChainError::StaleProof(_) => StatusCode::CONFLICT,
                    ChainError::ProofSearchExhausted(_) | ChainError::MiningCancelled => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// Accepts both the short field names and the `confirmation_*` names used by
/// the wallet frontend.
#[derive(Debug, Deserialize)]
pub struct NewTransactionForm {
    #[serde(alias = "confirmation_sender_public_key")]
    pub sender_public_key: Option<String>,
    #[serde(alias = "confirmation_recipient_public_key")]
    pub recipient_public_key: Option<String>,
    #[serde(alias = "transaction_signature")]
    pub signature: Option<String>,
    #[serde(alias = "confirmation_amount")]
    pub amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNodesForm {
    pub nodes: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/chain", get(get_chain))
        .route("/mine", get(mine))
        .route("/transactions/get", get(get_transactions))
        .route("/transactions/new", post(new_transaction))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/get", get(get_nodes))
        .route("/nodes/resolve", get(resolve_nodes))
        .route("/wallet/new", post(new_wallet))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_api_server(node: Arc<Node>, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn get_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let blockchain = node.blockchain.read().await;
    Json(ChainResponse::from_chain(&blockchain.blocks))
}

async fn get_transactions(State(node): State<Arc<Node>>) -> Json<Value> {
    let blockchain = node.blockchain.read().await;
    Json(json!({ "transactions": blockchain.mempool.transactions() }))
}

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<Value>, ApiError> {
    let block = node.mine().await?;
    Ok(Json(json!({
        "message": "New block created",
        "index": block.index,
        "transactions": block.transactions,
        "nonce": block.nonce,
        "previous_hash": block.previous_hash,
    })))
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    Form(form): Form<NewTransactionForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(sender), Some(recipient), Some(signature), Some(amount)) =
        (form.sender_public_key, form.recipient_public_key, form.signature, form.amount)
    else {
        return Err(ApiError::InvalidInput("Missing values".to_string()));
    };

    let amount: u64 = amount
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("Invalid amount: {}", amount)))?;

    let index = node
        .submit_transaction(&sender, &recipient, &signature, amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("Transaction will be added to Block {}", index) })),
    ))
}

async fn register_nodes(
    State(node): State<Arc<Node>>,
    Form(form): Form<RegisterNodesForm>,
) -> Result<Json<Value>, ApiError> {
    let nodes = form
        .nodes
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Please supply a valid list of nodes".to_string()))?;

    let total_nodes = node.register_nodes(&nodes).await?;
    Ok(Json(json!({
        "message": "New nodes have been added",
        "total_nodes": total_nodes,
    })))
}

async fn get_nodes(State(node): State<Arc<Node>>) -> Json<Value> {
    let blockchain = node.blockchain.read().await;
    Json(json!({ "nodes": blockchain.nodes.list() }))
}

async fn resolve_nodes(State(node): State<Arc<Node>>) -> Json<Value> {
    let replaced = node.resolve_conflicts().await;
    let blockchain = node.blockchain.read().await;
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Json(json!({
        "message": message,
        "replaced": replaced,
        "chain": blockchain.blocks,
    }))
}

async fn new_wallet() -> Json<Value> {
    let keypair = KeyPair::generate();
    Json(json!({
        "private_key": keypair.secret_key_hex(),
        "public_key": keypair.public_key_hex(),
    }))
}
