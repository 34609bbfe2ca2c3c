// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use lms_backend::{
    config::Config,
    routes,
    services::{auth::seed_users, courses::seed_catalog},
    state::AppState,
    storage::{SharedStore, Stores, file::FileStore, memory::MemoryStore, postgres::PgStore},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let backend = open_backend(&config).await;
    let stores = Stores::new(backend);

    // Seed demo accounts and the course catalogue
    if let Err(e) = seed_users(&stores, &config).await {
        tracing::error!("Failed to seed users: {:?}", e);
    }
    match stores.courses.seed_if_empty(seed_catalog()).await {
        Ok(true) => tracing::info!("Course catalogue seeded."),
        Ok(false) => {}
        Err(e) => tracing::error!("Failed to seed courses: {:?}", e),
    }

    let state = AppState::new(stores, config.clone());

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Postgres when `DATABASE_URL` is set, else the JSON file in `DATA_FILE`,
/// else process memory.
async fn open_backend(config: &Config) -> SharedStore {
    if let Some(database_url) = &config.database_url {
        // Initialize Database Pool with Retry
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > 5 {
                        panic!("Failed to connect to database after 5 retries: {}", e);
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");

        // Run Migrations Automatically
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations");
        tracing::info!("Migrations applied successfully.");

        return Arc::new(PgStore::new(pool));
    }

    if let Some(path) = &config.data_file {
        tracing::info!("Using JSON data file {}", path);
        let store = FileStore::open(path)
            .await
            .expect("Failed to open data file");
        return Arc::new(store);
    }

    tracing::warn!("No DATABASE_URL or DATA_FILE set, data will not survive a restart");
    Arc::new(MemoryStore::default())
}
