use report_core::{AppViewModel, VisibleMode};

const BAR_WIDTH: usize = 20;

/// Text for the one visible panel.
pub fn render(view: &AppViewModel) -> Vec<String> {
    match view.mode {
        VisibleMode::Upload => {
            let mut lines = vec!["Upload an Excel file (.xlsx or .xls, max 10MB)".to_string()];
            if let Some(info) = &view.file_info {
                lines.push(format!("Selected File: {} ({})", info.name, info.size_label));
            }
            lines
        }
        VisibleMode::Progress => vec![format!(
            "{} {:>3}% {}",
            progress_bar(view.progress_percent),
            view.progress_percent,
            view.progress_label
        )],
        VisibleMode::Success => {
            let mut lines = vec![format!(
                "Success: {}",
                view.success_message.as_deref().unwrap_or_default()
            )];
            if let Some(filename) = &view.result_filename {
                lines.push(format!("Report: {filename}"));
            }
            lines
        }
        VisibleMode::Error => vec![format!(
            "Error: {}",
            view.error_message.as_deref().unwrap_or_default()
        )],
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
