use std::sync::Arc;

use lyvo::config::Config;
use lyvo::db::{MemoryStore, PgStore, Store};
use lyvo::engine::Engine;
use lyvo::error::Error;
use lyvo::external::directions::Directions;
use lyvo::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => Arc::new(PgStore::new(database_url, config.max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL is not set, data will only be kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    if config.directions.is_none() {
        tracing::warn!("directions provider is not configured, rides are created without routes");
    }

    let directions = config.directions.clone().map(Directions::new);

    let engine = Engine::new(store, config.pricing, directions);

    serve(engine, config.addr).await
}
