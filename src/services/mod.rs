pub mod submission_service;

pub use submission_service::{Report, SubmissionClient, SubmissionService};
