use std::sync::Arc;

mod config;
mod error;
mod facility;
mod logging;
mod models;
mod rest;
mod store;

use store::postgres::{establish_db_connection, run_migrations, PostgresStore};

#[tokio::main]
async fn main() {
    logging::init();

    let db_conn = establish_db_connection()
        .await
        .expect("Could not establish database connection");
    run_migrations(&db_conn)
        .await
        .expect("Failed running migrations");

    let store = Arc::new(PostgresStore::new(db_conn));
    let service = facility::FacilityService::new(store.clone(), store);

    rest::dispatch_server_daemon(service).await;
}
