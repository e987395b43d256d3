// Service modules (daemon functionality)
pub mod authz;
pub mod config;
pub mod database;
pub mod http_server;
pub mod process;
pub mod state;

// Re-exports for consumers
pub use config::Config as ServiceConfig;
pub use state::State as ServiceState;
