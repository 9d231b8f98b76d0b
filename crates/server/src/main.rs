use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ferry_server::{Server, ServerConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ferry-server")]
#[command(about = "Serves the files of one site over HTTP/1.1", long_about = None)]
struct Cli {
    /// Site to serve, a directory below the files directory
    site: String,

    /// Port to listen on
    #[arg(default_value_t = 8000)]
    port: u16,

    #[arg(long, default_value = "files")]
    files_dir: PathBuf,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Close connections idle for this many seconds
    #[arg(long)]
    idle_timeout: Option<u64>,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::builder()
        .root(cli.files_dir.join(&cli.site))
        .address(format!("{}:{}", cli.host, cli.port))
        .idle_timeout(cli.idle_timeout.map(Duration::from_secs))
        .build()?;

    Server::bind(config).await?.serve().await;
    Ok(())
}
