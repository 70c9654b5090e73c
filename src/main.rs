use clap::Parser;
use std::process::ExitCode;
use tidydesk::cli::{Cli, run_cli};
use tidydesk::logging;
use tidydesk::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_level, cli.log_file.as_deref());

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
