use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// address for the HTTP server to listen on
    pub listen_addr: SocketAddr,
    /// public base URL of the server; capability invocation targets and
    ///  the signed `host` header are derived from it
    pub base_url: Url,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // session-authenticated hub lifecycle
    /// accounts admitted by the permission bridge; empty admits any
    ///  authenticated account
    pub accounts: Vec<String>,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
