//! Plain-text rendering for `rosterhub summary`.

use std::fmt::Write;
use std::path::Path;

use rosterhub_store::CollectionSummary;

/// One line per collection: name, record count, and file health.
///
/// Collections the store only reads (no manager in this process) show `-`.
pub fn render_summary(data_dir: &Path, summary: &[CollectionSummary]) -> String {
    let width = summary
        .iter()
        .map(|s| s.kind.name().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "Data directory: {}", data_dir.display());
    for entry in summary {
        let health = match &entry.status {
            None => "-".to_string(),
            Some(status) if status.is_healthy() => "ok".to_string(),
            Some(status) => match (&status.load_error, &status.save_error) {
                (_, Some(e)) => format!("write failed: {e}"),
                (Some(e), None) => format!("read failed: {e}"),
                (None, None) => "ok".to_string(),
            },
        };
        let _ = writeln!(
            out,
            "  {:<width$}  {:>6}  {}",
            entry.kind.name(),
            entry.records,
            health,
            width = width
        );
    }
    out
}
