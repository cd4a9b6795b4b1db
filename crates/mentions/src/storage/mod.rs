//! Report persistence.
//!
//! Each run is written as a single markdown or JSON file.

mod report;
mod writer;

pub use report::RunReport;
pub use writer::{read_record_ids, ReportWriter};
