//! CLI run handler: wire up logging, the space, the run database, the
//! evaluator link, and the tuning loop.

use anyhow::Result;
use log::{debug, info};

use crate::engine::arg_parser::Cli;
use crate::engine::rundb;
use crate::link::TcpLink;
use crate::pipeline::{RunEnd, TrialBudget, install_interrupt_handler};
use crate::search::{TuneOpts, run_tuning};
use crate::space::ParamSpace;
use crate::utils::setup_logging;

/// Run one tuning session from parsed arguments. Returns how the run ended
/// so `main` can map it to the process exit status.
pub fn handle_run(cli: &Cli) -> Result<RunEnd> {
    setup_logging(cli.verbose);
    let space = ParamSpace::from_json_file(&cli.space)?;
    let program = cli.program_name();
    let db_path = cli.db_path();
    let conn = rundb::open_db(&db_path)?;
    rundb::record_program(&conn, &program)?;
    info!(
        "tuning {}: {} parameters, {} trials, depth {}",
        program,
        space.params.len(),
        cli.trials,
        cli.depth
    );

    let budget = TrialBudget::new(cli.trials);
    install_interrupt_handler(&budget)?;

    let link = if cli.listen {
        TcpLink::accept(&cli.addr)?
    } else {
        TcpLink::connect(&cli.addr)?
    };

    let opts = TuneOpts {
        depth: cli.depth,
        seed: cli.seed,
        verbose: cli.verbose,
    };
    let outcome = run_tuning(link, &space, &opts, &budget, Some(&conn))?;

    match &outcome.best {
        Some((_, millis)) => info!(
            "best configuration: {:.3}ms ({} of {} trials reported)",
            millis, outcome.reported, outcome.submitted
        ),
        None => info!(
            "no successful trials ({} of {} reported)",
            outcome.reported, outcome.submitted
        ),
    }
    debug!("run ended: {:?}", outcome.end);
    Ok(outcome.end)
}
