mod cli;
mod effects;
mod input;
mod render;
mod session;

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use report_core::SessionState;
use report_logging::report_info;

fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Args::parse();
    report_logging::initialize(args.log_destination(), args.log_level(), &args.log_file);

    let options = args.session_options();
    let file = input::load_selection(&args.file, options.controller.max_upload_bytes)?;

    let stdout = io::stdout();
    let report = session::run_session(options, file, &mut stdout.lock())
        .context("upload session failed")?;

    if let Some(path) = &report.downloaded {
        println!("Saved report to {}", path.display());
    }
    report_info!("Session finished in state {:?}", report.view.state);

    Ok(match report.view.state {
        SessionState::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
