use std::io;
use std::process::ExitCode;

use snmp_session::{bootstrap, logging};
use tracing::error;

fn main() -> ExitCode {
    logging::init_tracing();

    let config = bootstrap::default_config();
    let mut stdout = io::stdout().lock();

    match bootstrap::run(&config, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", bootstrap::failure_message(&e));
            ExitCode::FAILURE
        }
    }
}
