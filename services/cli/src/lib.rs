mod cli;

use teacher_sweep::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
