//! Feature assembly
//!
//! Builds feature tables from manual entry or uploaded CSV files.

pub mod manual;
pub mod upload;

pub use manual::ManualInput;
pub use upload::{AssembledUpload, RowIssue, UploadedFrame};
