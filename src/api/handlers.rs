use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::policy::TX_PER_BLOCK;
use crate::blockchain::{Block, BlockInfo, Blockchain, Transaction, TransactionSearch, Validation};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Response for the status endpoint
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Number of pending transactions
    pub mempool: usize,

    /// Number of blocks, genesis included
    pub blocks: usize,

    /// Result of validating the whole chain
    pub is_valid: Validation,

    pub last_block: Block,
}

/// Response for the mempool endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MempoolResponse {
    /// Transactions the next template will carry
    pub next: Vec<Transaction>,

    /// Number of pending transactions
    pub total: usize,
}

/// Get the chain status
///
/// Returns the chain size, mempool size and chain validity
#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses(
        (status = 200, description = "Status retrieved successfully", body = StatusResponse)
    )
)]
pub async fn get_status(blockchain: BlockchainData) -> impl Responder {
    let response = StatusResponse {
        mempool: blockchain.get_pending_transactions().len(),
        blocks: blockchain.len(),
        is_valid: blockchain.is_valid(),
        last_block: blockchain.get_last_block(),
    };

    HttpResponse::Ok().json(response)
}

/// Get the next block template
///
/// Returns what the next block should contain, if anything is pending
#[utoipa::path(
    get,
    path = "/api/v1/blocks/next",
    responses(
        (status = 200, description = "Template for the next block", body = BlockInfo),
        (status = 404, description = "No pending transactions to mine")
    )
)]
pub async fn get_next_block(blockchain: BlockchainData) -> impl Responder {
    match blockchain.get_next_block() {
        Some(info) => HttpResponse::Ok().json(info),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "No pending transactions to mine"
        })),
    }
}

/// Get a block by index or hash
#[utoipa::path(
    get,
    path = "/api/v1/blocks/{index_or_hash}",
    params(
        ("index_or_hash" = String, Path, description = "Block index or block hash")
    ),
    responses(
        (status = 200, description = "Block found", body = Block),
        (status = 404, description = "Block not found")
    )
)]
pub async fn get_block(blockchain: BlockchainData, index_or_hash: web::Path<String>) -> impl Responder {
    let key = index_or_hash.into_inner();

    let block = match key.parse::<u64>() {
        Ok(index) => blockchain.get_block_by_index(index),
        Err(_) => blockchain.get_block(&key),
    };

    match block {
        Some(block) => HttpResponse::Ok().json(block),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Block {} not found", key)
        })),
    }
}

/// Submit a mined block
#[utoipa::path(
    post,
    path = "/api/v1/blocks",
    request_body = Block,
    responses(
        (status = 201, description = "Block appended", body = Block),
        (status = 400, description = "Block rejected by validation", body = Validation),
        (status = 422, description = "Malformed block")
    )
)]
pub async fn add_block(blockchain: BlockchainData, block: web::Json<Block>) -> impl Responder {
    let block = block.into_inner();

    let validation = blockchain.add_block(block.clone());
    if validation.success {
        HttpResponse::Created().json(block)
    } else {
        HttpResponse::BadRequest().json(validation)
    }
}

/// Get pending transactions
///
/// Returns the transactions the next template will carry and the mempool size
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    responses(
        (status = 200, description = "Mempool summary", body = MempoolResponse)
    )
)]
pub async fn get_mempool(blockchain: BlockchainData) -> impl Responder {
    let pending = blockchain.get_pending_transactions();

    let response = MempoolResponse {
        total: pending.len(),
        next: pending.into_iter().take(TX_PER_BLOCK).collect(),
    };

    HttpResponse::Ok().json(response)
}

/// Find a transaction by hash
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{hash}",
    params(
        ("hash" = String, Path, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "Transaction found", body = TransactionSearch),
        (status = 404, description = "Transaction not found", body = TransactionSearch)
    )
)]
pub async fn get_transaction(blockchain: BlockchainData, hash: web::Path<String>) -> impl Responder {
    let search = blockchain.get_transaction(&hash);

    if search.is_found() {
        HttpResponse::Ok().json(search)
    } else {
        HttpResponse::NotFound().json(search)
    }
}

/// Submit a signed transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = Transaction,
    responses(
        (status = 201, description = "Transaction queued; message carries its hash", body = Validation),
        (status = 400, description = "Transaction rejected by validation", body = Validation),
        (status = 422, description = "Malformed transaction")
    )
)]
pub async fn add_transaction(blockchain: BlockchainData, transaction: web::Json<Transaction>) -> impl Responder {
    let validation = blockchain.add_transaction(transaction.into_inner());

    if validation.success {
        HttpResponse::Created().json(validation)
    } else {
        HttpResponse::BadRequest().json(validation)
    }
}
