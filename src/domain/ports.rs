use crate::domain::model::{AnalysisRecord, ComparisonInput, Direction, VerificationOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn output_path(&self) -> &str;
    fn methods(&self) -> &[String];
    fn include_passed(&self) -> bool;
    fn bundle(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ComparisonInput>;
    async fn transform(&self, input: ComparisonInput) -> Result<VerificationOutcome>;
    async fn load(&self, outcome: VerificationOutcome) -> Result<String>;
}

/// Seam to the sliding-block solvers. The physics implementations live in
/// the candidate package; this crate only drives them and checks results.
pub trait AnalysisEngine: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    /// Maximum sliding displacement in metres for one record and direction.
    fn displacement(&self, record: &AnalysisRecord, direction: Direction) -> Result<f64>;
}
