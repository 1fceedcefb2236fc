use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::game::Game;
use server::network::Server;
use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Directory for the credential and leaderboard files
    #[clap(short, long, default_value = "data")]
    data_dir: PathBuf,
    /// Word list to draw reference words from, one per line
    #[clap(short, long)]
    words: Option<PathBuf>,
    /// Seconds players have to opt in before a round starts
    #[clap(long, default_value_t = 10)]
    countdown_secs: u64,
    /// Length of a round in seconds
    #[clap(long, default_value_t = 60)]
    round_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            data_dir: args.data_dir,
            words_file: args.words,
            countdown: Duration::from_secs(args.countdown_secs),
            round_duration: Duration::from_secs(args.round_secs),
            ..ServerConfig::default()
        }
    }
}

/// Parses command-line arguments, loads persisted state and serves clients
/// until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    let address = config.address();

    let game = Game::open(config).await?;
    let server = Server::bind(&address, game).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
