use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use report_core::ControllerConfig;
use report_engine::EngineConfig;
use report_logging::LogDestination;
use url::Url;

use crate::session::SessionOptions;

/// Convert an EDR spreadsheet into a PowerPoint report using the conversion service.
#[derive(Debug, Parser)]
#[command(name = "report_app", version)]
pub struct Args {
    /// Spreadsheet to convert (.xlsx or .xls, at most 10MB).
    pub file: PathBuf,

    /// Base URL of the conversion service.
    #[arg(long, default_value = "http://127.0.0.1:5000/")]
    pub server: Url,

    /// Directory the finished report is saved to.
    #[arg(long, default_value = "reports")]
    pub download_dir: PathBuf,

    /// Stop once the report is ready instead of downloading it.
    #[arg(long)]
    pub no_download: bool,

    /// Upper bound for one request to the service, in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    #[arg(long, default_value = report_logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl Args {
    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        let mut engine = EngineConfig::new(self.server.clone(), self.download_dir.clone());
        engine.service.request_timeout = Duration::from_secs(self.timeout_secs.max(1));
        SessionOptions {
            engine,
            controller: ControllerConfig::default(),
            auto_download: !self.no_download,
        }
    }
}
