//! Engine module: CLI surface, run persistence, progress display.

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod rundb;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use rundb::{
    best_trial, count_trials, open_db, open_db_in_memory, record_final, record_outcome,
    record_program, record_submitted,
};
