use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, App, HttpServer};
use std::io;
use std::sync::Arc;

use todoshare::{
    error,
    routes,
    store::{MemoryStore, PgStore, Store},
    AppState, Config,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;
    error::expose_internal_details(!config.is_production());

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await.map_err(io::Error::other)?;
            log::info!("Connected to PostgreSQL");
            Arc::new(store)
        }
        None => {
            log::warn!("DATABASE_URL is not set, data will be kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(&config, store);
    let cors_origin = config.cors_origin.clone();

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);
        let state = state.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .configure(move |cfg| state.register(cfg))
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
