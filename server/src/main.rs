use clap::Parser;
use log::info;
use server::config::Scenario;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Scenario file (settings + map); read from stdin when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Per-turn move collection deadline in milliseconds
    #[arg(short = 't', long, default_value = "1000")]
    move_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::from_reader(std::io::stdin().lock())?,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(
        &address,
        scenario,
        Duration::from_millis(args.move_timeout_ms),
    )
    .await?;

    // Abort only between turns; no resolution phase is interrupted mid-phase.
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, shutting down");
        }
    }

    Ok(())
}
