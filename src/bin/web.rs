//! Single binary web server exposing the bracket engine over REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! With DATABASE_URL set, tournaments are kept in PostgreSQL; otherwise in memory.

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware, web::Data, App, HttpServer};
use std::sync::Arc;
use tournament_bracket::{api, config::Config, MemoryStore, PgStore, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .map_err(std::io::Error::other)?;
            log::info!("Using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            log::warn!("DATABASE_URL not set, tournaments are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let store: Data<dyn Store> = Data::from(store);

    let key = match &config.session_key {
        Some(bytes) => Key::from(bytes.as_slice()),
        None => {
            log::warn!("SESSION_KEY not set, sessions will not survive a restart");
            Key::generate()
        }
    };

    let bind = config.bind_address();
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(SessionMiddleware::new(CookieSessionStore::default(), key.clone()))
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
