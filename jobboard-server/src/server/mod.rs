pub mod auth_routes;
pub mod config;
mod http_layers;
pub mod job_routes;
pub mod response;
pub mod server;
pub(self) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use response::{ApiError, ApiResponse, ErrorDetail};
pub use server::{make_app, run_server};
pub use session::Session;
