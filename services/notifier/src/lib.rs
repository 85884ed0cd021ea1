mod audit;
mod cli;
mod infra;

use credwatch::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
