use clap::Parser;
use netwars::NetwarsServer;
use tracing_subscriber::EnvFilter;

/// Authoritative Netwars game server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TCP port to listen on
    #[arg(short, long, default_value_t = 5555)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let cli = Cli::parse();

    let server = NetwarsServer::builder()
        .bind(&format!("0.0.0.0:{}", cli.port))
        .build()
        .await?;
    tracing::info!(port = cli.port, "server listening");

    server.run().await?;
    Ok(())
}
