use roshambo::RoshamboServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let public_url = std::env::var("PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://{bind_addr}"));

    let server = RoshamboServer::builder()
        .bind(&bind_addr)
        .public_url(&public_url)
        .build()
        .await?;

    tracing::info!(bind_addr, public_url, "starting");
    server.run().await?;
    Ok(())
}
