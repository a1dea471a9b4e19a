use mock_server::{AppState, Store, COLLECTION_ID};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let token = std::env::var("WEBFLOW_API_KEY").unwrap_or_else(|_| "mock-token".to_string());
    let seed = std::env::var("MOCK_ITEMS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut store = Store::seeded();
    store.seed_items(COLLECTION_ID, seed);

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, items = seed, "mock Webflow API listening");
    mock_server::run(listener, AppState::new(&token, store)).await
}
