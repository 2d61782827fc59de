use clap::Parser;
use client::network::Connection;
use client::strategy::RandomStrategy;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut connection = Connection::connect(&args.server).await?;
    let player_id = connection.info.player_id;
    let mut strategy = RandomStrategy::new(args.seed);

    loop {
        let status = match connection.read_status().await {
            Ok(status) => status,
            Err(e) => {
                // The server closes all channels once the game is over.
                info!("Game over ({})", e);
                break;
            }
        };

        let mv = strategy.choose(&status, player_id);
        connection.send_move(mv).await?;
    }

    Ok(())
}
