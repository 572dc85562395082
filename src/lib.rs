//! Export form submissions from the Jotform API to the console, a JSON file and a CSV file.

pub mod api_client;
pub mod config;
pub mod data_exporter;
pub mod error;
pub mod logging;
pub mod services;
pub mod submission;

pub use api_client::{ApiClient, Credentials, SubmissionSource};
pub use data_exporter::{ColumnPolicy, DataExporter, SubmissionTable};
pub use error::{Result, SubmissionError};
pub use services::{Report, SubmissionClient, SubmissionService};
pub use submission::{Answer, Submission, SubmissionResponse};
