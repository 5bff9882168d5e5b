mod catalogue;
mod cli;
mod infra;
mod routes;
mod server;

use corpus_maria::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
