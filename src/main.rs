//! coderunner: select scopes of a codebase and run LLM prompts over them

use std::process::ExitCode;

fn main() -> ExitCode {
    match coderunner::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            coderunner::cli::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
