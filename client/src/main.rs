use clap::Parser;
use client::network::{Client, Mode};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Session code to join; omit to create a new session
    #[arg(short = 'j', long)]
    join: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mode = match args.join {
        Some(session_id) => Mode::Join(session_id),
        None => Mode::Create,
    };

    let mut client = Client::new(&args.server).await?;
    client.run(mode).await?;

    Ok(())
}
