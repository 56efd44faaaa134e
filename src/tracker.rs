//! Tracker HTTP client, attachment uploads and response interpretation.
pub(crate) mod attachments;
pub(crate) mod client;
pub(crate) mod response;

pub use attachments::{AttachmentResult, file_refs, upload_all};
pub use client::{RawResponse, TrackerClient};
pub use response::{SubmissionOutcome, interpret};
