mod cli;
mod infra;
mod replay;
mod routes;
mod server;

use action_feed::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
