mod cli;
mod demo;
mod runner;

use deposit_archive::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
