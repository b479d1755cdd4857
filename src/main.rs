use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::{debug, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

mod api;
mod blockchain;
mod config;
mod miner;

use blockchain::{Blockchain, Wallet};

// Recovers the wallet from a configured key, or creates a fresh one
fn load_wallet(private_key: Option<&str>, role: &str) -> anyhow::Result<Wallet> {
    let wallet = match private_key {
        Some(key) => Wallet::from_private_key(key)
            .with_context(|| format!("Failed to recover {} wallet", role))?,
        None => {
            let wallet = Wallet::new();
            info!("Created {} wallet; set its private key in the config to reuse it", role);
            debug!("{} wallet private key (WIF): {}", role, wallet.export_wif());
            wallet
        }
    };

    info!("Using {} wallet {}", role, wallet.address());
    Ok(wallet)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_status,
        api::handlers::get_next_block,
        api::handlers::get_block,
        api::handlers::add_block,
        api::handlers::get_mempool,
        api::handlers::get_transaction,
        api::handlers::add_transaction
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::BlockInfo,
            blockchain::Transaction,
            blockchain::TransactionType,
            blockchain::TransactionInput,
            blockchain::TransactionOutput,
            blockchain::TransactionSearch,
            blockchain::Validation,
            blockchain::FailureKind,
            blockchain::Address,
            blockchain::DigitalSignature,
            api::handlers::StatusResponse,
            api::handlers::MempoolResponse
        )
    ),
    tags(
        (name = "protochain", description = "Proof-of-work ledger endpoints")
    ),
    info(
        title = "Protochain API",
        version = "0.1.0",
        description = "A single-node proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::load_config().context("Failed to load configuration")?;

    let genesis_wallet = load_wallet(config.genesis.private_key.as_deref(), "genesis")?;
    let blockchain = Arc::new(Blockchain::new(genesis_wallet.address()));

    if config.miner.enabled {
        let wallet = load_wallet(config.miner.private_key.as_deref(), "miner")?;
        let miner = miner::Miner::new(blockchain.clone(), wallet, config.miner.poll_interval());
        actix_web::rt::spawn(miner.run());
    }

    let blockchain = web::Data::from(blockchain);
    let bind = (config.server.host.clone(), config.server.port);

    info!("Starting HTTP server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            .configure(api::configure_routes)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
