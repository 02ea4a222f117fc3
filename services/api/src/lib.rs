mod apply;
mod cli;
mod infra;
mod routes;
mod server;

use waitlist::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
