use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use server::store::{DataStore, FileSource, RecordSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Weather data file, four lines per city
    #[arg(short, long, default_value = "data.txt")]
    data_file: PathBuf,

    /// Receive buffer size in bytes
    #[arg(short, long, default_value_t = shared::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Maximum concurrent workers (0 = unbounded)
    #[arg(short = 'w', long, default_value = "0")]
    max_workers: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let bind_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let config = ServerConfig {
        bind_addr,
        data_file: args.data_file,
        buffer_size: args.buffer_size,
        max_workers: args.max_workers,
    };

    let source: Arc<dyn RecordSource> = Arc::new(FileSource::new(&config.data_file));
    let store = Arc::new(DataStore::new());

    match store.reload(Arc::clone(&source)).await {
        Ok(count) => info!("Read {} cities from {}", count, config.data_file.display()),
        Err(e) => error!("Starting with no weather data: {}", e),
    }

    let server = Server::bind(&config, store, source).await?;
    info!("Server started");

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down ({} requests served)", server.request_count());
        }
    }

    Ok(())
}
