use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use report_core::{
    update, AppState, AppViewModel, ControllerConfig, Msg, SelectedFile, VisibleMode,
};
use report_engine::{EngineConfig, EngineEvent};
use report_logging::report_debug;

use crate::effects::{map_event, EffectRunner};
use crate::render::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct SessionOptions {
    pub engine: EngineConfig,
    pub controller: ControllerConfig,
    /// Press Download as soon as the report is ready.
    pub auto_download: bool,
}

#[derive(Debug)]
pub struct SessionReport {
    pub view: AppViewModel,
    pub downloaded: Option<PathBuf>,
}

/// Drives one upload session to a terminal panel, rendering every change to `out`.
///
/// With `auto_download`, a successful session returns only after the report is
/// saved and the deferred cleanup has answered.
pub fn run_session(
    options: SessionOptions,
    file: SelectedFile,
    out: &mut dyn Write,
) -> anyhow::Result<SessionReport> {
    let mut driver = Driver {
        state: AppState::with_config(options.controller),
        runner: EffectRunner::new(options.engine)?,
        out,
    };
    driver.dispatch(Msg::FileSelected(Some(file)))?;

    let mut download_requested = false;
    let mut downloaded = None;
    let mut cleanup_done = false;

    loop {
        let view = driver.state.view();
        match view.mode {
            VisibleMode::Upload | VisibleMode::Error => {
                return Ok(SessionReport { view, downloaded });
            }
            VisibleMode::Success if !options.auto_download => {
                return Ok(SessionReport { view, downloaded });
            }
            VisibleMode::Success if !download_requested => {
                download_requested = true;
                driver.dispatch(Msg::DownloadClicked)?;
                continue;
            }
            VisibleMode::Success if downloaded.is_some() && cleanup_done => {
                return Ok(SessionReport { view, downloaded });
            }
            VisibleMode::Success | VisibleMode::Progress => {}
        }

        let Some(event) = driver.runner.next_event(POLL_INTERVAL) else {
            continue;
        };
        match &event {
            EngineEvent::DownloadCompleted {
                result: Ok(path), ..
            } => downloaded = Some(path.clone()),
            EngineEvent::CleanupCompleted { .. } => cleanup_done = true,
            _ => {}
        }
        if let Some(msg) = map_event(event) {
            driver.dispatch(msg)?;
        }
    }
}

struct Driver<'a> {
    state: AppState,
    runner: EffectRunner,
    out: &'a mut dyn Write,
}

impl Driver<'_> {
    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        report_debug!("dispatch {:?}", MsgName(&msg));
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in render(&state.view()) {
                writeln!(self.out, "{line}")?;
            }
        }
        self.state = state;
        self.runner.enqueue(effects);
        Ok(())
    }
}

/// Logs messages without dumping file contents.
struct MsgName<'a>(&'a Msg);

impl std::fmt::Debug for MsgName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Msg::FileSelected(Some(file)) => write!(f, "FileSelected({})", file.name),
            other => write!(f, "{other:?}"),
        }
    }
}
