//! Converted-score analysis across a student's chosen departments.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{AnalysisOutcome, AnalysisRequest, RequestError, ResultEntry};
pub use router::analysis_router;
pub use service::{rank_departments, AnalysisService, AnalysisServiceError, DepartmentError};
