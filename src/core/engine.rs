use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// What the binaries need from a finished run: where the report went and
/// whether the candidate was accepted.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report_path: String,
    pub accepted: bool,
    pub failures: Vec<String>,
    pub console_report: String,
}

pub struct VerifyEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> VerifyEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        println!("Starting verification run...");

        println!("Loading result sets...");
        let input = self.pipeline.extract().await?;
        println!("Paired {} analyses", input.pairs.len());
        self.monitor.log_phase("Extract");

        println!("Comparing against reference...");
        let outcome = self.pipeline.transform(input).await?;
        self.monitor.record_comparisons(outcome.summary.total_tests);
        println!("Compared {} individual tests", outcome.summary.total_tests);
        self.monitor.log_phase("Compare");

        println!("Writing report artifacts...");
        let accepted = outcome.accepted;
        let failures = outcome.failures.clone();
        let console_report = outcome.console_report.clone();
        let report_path = self.pipeline.load(outcome).await?;
        println!("Report saved to: {}", report_path);
        self.monitor.log_final_stats();

        Ok(RunOutcome {
            report_path,
            accepted,
            failures,
            console_report,
        })
    }
}
