//! Tunepipe CLI: tune a program against a remote evaluator.

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tunepipe::engine::arg_parser::Cli;
use tunepipe::engine::handle_run;

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let code = match handle_run(&cli) {
        Ok(end) => end.exit_code(),
        Err(err) => {
            eprintln!("tunepipe: {:#}", err);
            ExitCode::FAILURE
        }
    };
    log::debug!("Total time: {:?}", start_time.elapsed());
    code
}
