//! chunkfetch CLI Client
//!
//! Command-line interface for fetching chunks from a server.

use std::process::ExitCode;
use std::time::Instant;

use chunkfetch::{Client, Config};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// chunkfetch CLI
#[derive(Parser, Debug)]
#[command(name = "chunkfetch-cli")]
#[command(about = "CLI for the chunkfetch protocol")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Give up on a response after this long (milliseconds, 0 = never)
    #[arg(short = 't', long, default_value = "30000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch one or more chunks and print their data
    Fetch {
        /// Chunk ids to fetch
        #[arg(required = true)]
        chunk_ids: Vec<String>,
    },

    /// Repeatedly fetch chunk0..chunkN over one connection
    Stress {
        /// Number of fetches to perform
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Number of distinct chunk ids to cycle through
        #[arg(short, long, default_value = "100")]
        range: usize,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = Config::builder().read_timeout_ms(args.timeout_ms).build();

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> chunkfetch::Result<()> {
    let mut client = Client::connect(args.server.as_str(), config)?;

    match &args.command {
        Commands::Fetch { chunk_ids } => {
            for response in client.fetch_many(chunk_ids)? {
                println!(
                    "{}: {}",
                    response.chunk_id(),
                    String::from_utf8_lossy(response.data())
                );
            }
        }
        Commands::Stress { count, range } => {
            let range = (*range).max(1);
            let start = Instant::now();
            let mut bytes = 0usize;

            for i in 0..*count {
                let response = client.fetch(&format!("chunk{}", i % range))?;
                bytes += response.data().len();
            }

            let elapsed = start.elapsed();
            println!(
                "{} fetches, {} bytes in {:.3}s ({:.0} fetches/s)",
                count,
                bytes,
                elapsed.as_secs_f64(),
                *count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }
    }

    client.close()
}
