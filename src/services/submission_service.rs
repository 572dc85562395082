use crate::api_client::{ApiClient, Credentials, SubmissionSource};
use crate::config::Config;
use crate::data_exporter::{ColumnPolicy, DataExporter};
use crate::error::{Result, SubmissionError};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one presentation operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Printed { submissions: usize },
    Saved { path: PathBuf, submissions: usize },
    /// The fetch returned an empty payload, so nothing was printed
    NothingToShow,
    /// No usable payload, so no file was written
    NothingToSave,
    /// The payload had a `content` list but it was empty
    NoSubmissions,
}

impl Report {
    /// True when a file was written or text was printed
    pub fn produced_output(&self) -> bool {
        matches!(self, Report::Printed { .. } | Report::Saved { .. })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Printed { submissions } => write!(f, "Printed {} submissions", submissions),
            Report::Saved { path, submissions } => write!(
                f,
                "Saved {} submissions to '{}'",
                submissions,
                path.display()
            ),
            Report::NothingToShow => write!(f, "No data to show."),
            Report::NothingToSave => write!(f, "No data to save."),
            Report::NoSubmissions => write!(f, "No submissions found."),
        }
    }
}

/// Fetches a form's submissions and presents them as text, JSON or CSV.
///
/// Every operation performs its own fetch; nothing is cached between calls.
pub struct SubmissionService<S: SubmissionSource> {
    source: S,
    column_policy: ColumnPolicy,
}

/// The service wired to the live API
pub type SubmissionClient = SubmissionService<ApiClient>;

impl SubmissionService<ApiClient> {
    /// Build a live client from configuration. Fails with
    /// [`SubmissionError::InvalidConfiguration`] before any network access.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials =
            Credentials::from_options(config.api.api_key.clone(), config.api.form_id.clone())?;
        let timeout = match config.api.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = ApiClient::with_options(credentials, &config.api.base_url, timeout)?;

        Ok(Self::new(client).with_column_policy(config.output.csv_columns))
    }
}

impl<S: SubmissionSource> SubmissionService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            column_policy: ColumnPolicy::default(),
        }
    }

    pub fn with_column_policy(mut self, policy: ColumnPolicy) -> Self {
        self.column_policy = policy;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Write the whole payload as indented text to `out`
    pub fn print_submissions<W: Write>(&self, out: &mut W) -> Result<Report> {
        let response = self.source.fetch_submissions()?;
        if response.is_empty() {
            return Ok(Report::NothingToShow);
        }

        let text = DataExporter::render_text(&response)?;
        writeln!(out, "Submissions in JSON format:")
            .and_then(|_| writeln!(out, "{}", text))
            .map_err(|e| SubmissionError::persistence("<stdout>", e))?;

        Ok(Report::Printed {
            submissions: response.content().map_or(0, |c| c.len()),
        })
    }

    /// Save the whole payload as a JSON file, overwriting `path`
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<Report> {
        let path = path.as_ref();
        let response = self.source.fetch_submissions()?;
        if response.is_empty() {
            return Ok(Report::NothingToSave);
        }

        DataExporter::export_to_json(&response, path)?;
        let submissions = response.content().map_or(0, |c| c.len());
        info!(target: "export", "Saved JSON with {} submissions to {}", submissions, path.display());

        Ok(Report::Saved {
            path: path.to_path_buf(),
            submissions,
        })
    }

    /// Save the submissions as a CSV file, one row per submission
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<Report> {
        let path = path.as_ref();
        let response = self.source.fetch_submissions()?;

        let Some(submissions) = response.submissions()? else {
            warn!(target: "export", "Response has no 'content' list; skipping CSV");
            return Ok(Report::NothingToSave);
        };
        if submissions.is_empty() {
            return Ok(Report::NoSubmissions);
        }

        let table = DataExporter::build_table(&submissions, self.column_policy);
        DataExporter::export_to_csv(&table, path)?;
        info!(
            target: "export",
            "Saved CSV with {} submissions to {}",
            table.rows.len(),
            path.display()
        );

        Ok(Report::Saved {
            path: path.to_path_buf(),
            submissions: table.rows.len(),
        })
    }
}
