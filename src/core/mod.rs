pub mod compare;
pub mod data;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod stats;

pub use crate::domain::model::{
    AnalysisRecord, ComparisonInput, Direction, Method, PairedResult, VerificationData,
    VerificationOutcome, VerificationSummary,
};
pub use crate::domain::ports::{AnalysisEngine, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
