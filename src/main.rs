// src/main.rs
use std::sync::Arc;
use actix_web::{ web, App, HttpServer };
use env_logger::Env;
use log::{ error, info };
use status_hub::aggregator::Aggregator;
use status_hub::config::Config;
use status_hub::handlers;
use status_hub::provider::HttpStatusProvider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Load configuration
    let config = Config::from_env();
    let servers = match config.load_servers() {
        Ok(servers) => servers,
        Err(e) => {
            error!("Failed to load server list: {}", e);
            return Err(e.into());
        }
    };
    info!("Configured {} server(s), surfacing at most {}", servers.len(), config.max_servers_returned);

    let provider = match HttpStatusProvider::new(&config.provider_base_url, config.provider_timeout()) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to build status provider client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let bind = config.bind();
    let aggregator = web::Data::new(
        Aggregator::new(Arc::new(provider), servers, config.default_game_port)
    );
    let config = web::Data::new(config);

    info!("Starting server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(aggregator.clone())
            .app_data(config.clone())
            .route("/", web::get().to(handlers::index::index))
            .route("/status", web::get().to(handlers::status::get_status))
            .route("/api/server-status", web::get().to(handlers::status::get_status))
    })
        .bind(&bind)?
        .run().await
}
