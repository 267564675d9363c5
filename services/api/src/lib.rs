mod cli;
mod infra;
mod routes;
mod server;

use zuhaush::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
