//! Data models for wrapped process runs.

mod report;
mod state;

pub use report::RunReport;
pub use state::ProcessState;
