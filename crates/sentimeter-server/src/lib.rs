//! Sentimeter Server
//!
//! HTTP front end for batch sentiment prediction. A single `POST /predict`
//! classifies every submitted text and returns per-item results together
//! with a per-class summary and the most frequent words of the batch.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::{LimitsConfig, ServerConfig, ServiceConfig};
pub use routes::{create_router, AppError};
pub use state::AppState;
