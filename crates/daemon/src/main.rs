use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use url::Url;

use daemon::{process, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "hubd")]
#[command(about = "Encrypted data hub storage service")]
struct Args {
    /// Address for the HTTP server to listen on
    #[arg(long, default_value = "127.0.0.1:9876")]
    listen: SocketAddr,

    /// Public base URL clients use to reach this server;
    ///  capability targets and the signed `host` header derive from it
    #[arg(long, default_value = "http://127.0.0.1:9876")]
    base_url: Url,

    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    #[arg(long)]
    database: Option<PathBuf>,

    /// Accounts allowed to create and manage hubs (repeatable);
    ///  when none are given any authenticated account is admitted
    #[arg(long = "account")]
    accounts: Vec<String>,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Directory for log files (optional, logs to stdout only if not set)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = ServiceConfig {
        listen_addr: args.listen,
        base_url: args.base_url,
        sqlite_path: args.database,
        accounts: args.accounts,
        log_level: args.log_level,
        log_dir: args.log_dir,
    };

    if let Err(e) = process::start(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
