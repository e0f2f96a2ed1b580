use clap::Parser;
use log::info;
use server::network::Server;
use shared::{Grid, MAX_BOARD_DIM};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Board width in boxes for new sessions; capped so a full board's
    /// snapshot always fits in one datagram
    #[arg(short = 'w', long, default_value = "3",
          value_parser = clap::value_parser!(u8).range(1..=MAX_BOARD_DIM as i64))]
    width: u8,

    /// Board height in boxes for new sessions (no short flag to avoid
    /// conflict with --help)
    #[arg(long, default_value = "3",
          value_parser = clap::value_parser!(u8).range(1..=MAX_BOARD_DIM as i64))]
    height: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    info!(
        "Starting session server on {} with {}x{} boards",
        address, args.width, args.height
    );

    let mut server = Server::new(&address, Grid::new(args.width, args.height)).await?;
    server.run().await?;

    Ok(())
}
