use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::types::AnalysisReport;

/// Writes the full report envelope as pretty JSON, to `output_file` when
/// given, otherwise to stdout.
pub fn report_json(report: &AnalysisReport, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            let file = File::create(path)?;
            write_report(report, BufWriter::new(file))?;
            tracing::info!(path = %path.display(), "JSON report written");
        }
        None => {
            let stdout = std::io::stdout();
            write_report(report, BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

fn write_report<W: Write>(report: &AnalysisReport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyze, AnalysisInput, AnalysisOptions};

    #[test]
    fn test_writes_envelope_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = analyze(&AnalysisInput::default(), &AnalysisOptions::default());
        report_json(&report, Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["metadata"]["analysis_time"].is_u64());
        assert_eq!(value["data"]["commit_history"]["total_commits"], 0);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let report = analyze(&AnalysisInput::default(), &AnalysisOptions::default());
        let err = report_json(&report, Some(&path)).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)), "got {err:?}");
    }
}
