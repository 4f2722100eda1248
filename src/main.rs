use std::process::ExitCode;

use malaria_abm::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("malaria-sim: {e}");
            ExitCode::FAILURE
        }
    }
}
