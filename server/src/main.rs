use std::sync::Arc;

use minerace_server::ServerContext;
use minerace_server::session::run_connection;
use tokio::net::TcpListener;
use tracing::info;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let address: String = env_or("MINERACE_ADDR", "0.0.0.0".to_string());
    let port: u16 = env_or("MINERACE_PORT", 7849);

    let context = Arc::new(ServerContext::new());
    let listener = TcpListener::bind((address.as_str(), port)).await?;
    info!("listening on {}:{}", address, port);

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "accepted connection");
        tokio::spawn(run_connection(context.clone(), stream));
    }
}
