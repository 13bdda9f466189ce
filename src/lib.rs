mod cli;
pub mod demo;
pub mod error;
pub mod render;
pub mod telemetry;

pub use cli::{execute, load_json, parse_date};

use error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
