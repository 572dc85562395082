use crate::error::{Result, SubmissionError};
use crate::submission::{Submission, SubmissionResponse};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// How CSV columns are derived from the submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnPolicy {
    /// Columns come from the first submission only. Fields that first appear in a
    /// later submission are dropped from the output.
    #[default]
    FirstSubmission,
    /// Every field id seen in any submission, in first-seen order
    Union,
}

/// Header plus one row of cells per submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Turns a fetched payload into console text, a JSON file or a CSV file
pub struct DataExporter;

impl DataExporter {
    /// Pretty print the whole payload with 4-space indentation. Non-ASCII text is
    /// written as-is, not escaped.
    pub fn render_text(response: &SubmissionResponse) -> Result<String> {
        let bytes = Self::render_json_bytes(response)?;
        // serde_json only ever emits UTF-8
        String::from_utf8(bytes).map_err(|e| SubmissionError::Malformed(e.to_string()))
    }

    fn render_json_bytes(response: &SubmissionResponse) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        response
            .serialize(&mut serializer)
            .map_err(SubmissionError::Decode)?;
        Ok(out)
    }

    /// Write the full payload to `path`, replacing any existing file
    pub fn export_to_json(response: &SubmissionResponse, path: &Path) -> Result<()> {
        let mut bytes = Self::render_json_bytes(response)?;
        bytes.push(b'\n');

        fs::write(path, &bytes).map_err(|e| SubmissionError::persistence(path, e))?;
        debug!(target: "export", "Wrote {} bytes of JSON to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Derive the CSV header and rows.
    ///
    /// A header field missing from a submission yields an empty cell; it never fails
    /// the table.
    pub fn build_table(submissions: &[Submission], policy: ColumnPolicy) -> SubmissionTable {
        let columns = Self::columns(submissions, policy);

        let headers = columns.iter().map(|(_, label)| label.clone()).collect();
        let rows = submissions
            .iter()
            .map(|submission| {
                columns
                    .iter()
                    .map(|(field_id, _)| {
                        submission
                            .answer(field_id)
                            .map(|a| a.display_value())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        SubmissionTable { headers, rows }
    }

    /// `(field_id, label)` pairs in output order
    fn columns(submissions: &[Submission], policy: ColumnPolicy) -> Vec<(String, String)> {
        match policy {
            ColumnPolicy::FirstSubmission => submissions
                .first()
                .map(|first| {
                    first
                        .answers
                        .iter()
                        .map(|a| (a.field_id.clone(), a.column_label()))
                        .collect()
                })
                .unwrap_or_default(),
            ColumnPolicy::Union => {
                let mut columns: Vec<(String, String)> = Vec::new();
                for answer in submissions.iter().flat_map(|s| s.answers.iter()) {
                    if !columns.iter().any(|(id, _)| *id == answer.field_id) {
                        columns.push((answer.field_id.clone(), answer.column_label()));
                    }
                }
                columns
            }
        }
    }

    /// Write a header row and one row per submission. On failure the file may be left
    /// partially written.
    pub fn export_to_csv(table: &SubmissionTable, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| SubmissionError::csv(path, e))?;

        wtr.write_record(&table.headers)
            .map_err(|e| SubmissionError::csv(path, e))?;
        for row in &table.rows {
            wtr.write_record(row)
                .map_err(|e| SubmissionError::csv(path, e))?;
        }

        wtr.flush().map_err(|e| SubmissionError::persistence(path, e))?;
        debug!(
            target: "export",
            "Wrote {} columns x {} rows to {}",
            table.headers.len(),
            table.rows.len(),
            path.display()
        );
        Ok(())
    }
}
