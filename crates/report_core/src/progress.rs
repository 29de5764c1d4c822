/// Fixed narrative shown on the progress panel.
///
/// The service answers with one final response, so these steps track the
/// request lifecycle rather than server-side work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Uploading,
    Validating,
    Generating,
    Finalizing,
    Complete,
}

impl ProgressStep {
    pub fn percent(self) -> u8 {
        match self {
            ProgressStep::Uploading => 10,
            ProgressStep::Validating => 30,
            ProgressStep::Generating => 60,
            ProgressStep::Finalizing => 90,
            ProgressStep::Complete => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressStep::Uploading => "Uploading file...",
            ProgressStep::Validating => "Validating Excel format...",
            ProgressStep::Generating => "Generating PowerPoint report...",
            ProgressStep::Finalizing => "Finalizing report...",
            ProgressStep::Complete => "Report ready",
        }
    }
}
