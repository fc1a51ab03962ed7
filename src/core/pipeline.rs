use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;

use zip::write::{FileOptions, ZipWriter};

use crate::config::tolerance::ToleranceConfig;
use crate::core::compare::ComparisonEngine;
use crate::core::data::DataManager;
use crate::core::report::{self, ReportInputs};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    AnalysisRecord, ComparisonInput, Method, PairedResult, VerificationOutcome,
};
use crate::utils::error::{Result, VerifyError};

/// The verification run as an extract → transform → load pipeline: pair the
/// two result sets, compare them, write the report artifacts.
pub struct VerificationPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    data: DataManager,
    compare: ComparisonEngine,
    candidate_version: String,
}

impl<S: Storage, C: ConfigProvider> VerificationPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        tolerances: ToleranceConfig,
        candidate_version: String,
    ) -> Self {
        let data = DataManager::new(config.data_dir());
        Self {
            storage,
            config,
            data,
            compare: ComparisonEngine::new(tolerances),
            candidate_version,
        }
    }

    fn method_filter(&self) -> Result<Vec<Method>> {
        self.config
            .methods()
            .iter()
            .map(|m| Method::from_str(m))
            .collect()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for VerificationPipeline<S, C> {
    async fn extract(&self) -> Result<ComparisonInput> {
        let reference = self.data.load_reference()?;
        let candidate = self.data.load_candidate(&self.candidate_version)?;

        if let Some(file_version) = &candidate.metadata.source_version {
            if file_version != &self.candidate_version {
                tracing::warn!(
                    "⚠️ Results file metadata says version {}, verifying as {}",
                    file_version,
                    self.candidate_version
                );
            }
        }

        let methods = self.method_filter()?;
        let reference_records = self.data.filter_analyses(&reference, &methods, &[], &[]);
        let candidate_records = self.data.filter_analyses(&candidate, &methods, &[], &[]);

        tracing::debug!(
            "Pairing {} reference and {} candidate records",
            reference_records.len(),
            candidate_records.len()
        );

        let mut candidate_by_id: HashMap<String, AnalysisRecord> = candidate_records
            .into_iter()
            .map(|record| (record.analysis_id.clone(), record))
            .collect();

        let mut pairs = Vec::with_capacity(reference_records.len());
        let mut unmatched = 0usize;

        for reference_record in reference_records {
            match candidate_by_id.remove(&reference_record.analysis_id) {
                Some(candidate_record) => pairs.push(PairedResult {
                    candidate: candidate_record.results,
                    reference: reference_record,
                }),
                None => {
                    tracing::warn!(
                        "  Skipping {}: no candidate result",
                        reference_record.analysis_id
                    );
                    unmatched += 1;
                }
            }
        }

        if unmatched > 0 {
            tracing::warn!("⚠️ {} reference analyses had no candidate result", unmatched);
        }

        // A candidate id the reference set does not know cannot have come
        // from the current test matrix.
        if let Some(orphan) = candidate_by_id.into_keys().next() {
            return Err(VerifyError::StaleCache {
                key: orphan,
                message: "candidate results contain an analysis id missing from the reference set"
                    .to_string(),
            });
        }

        Ok(ComparisonInput {
            reference_version: reference.version_string().to_string(),
            candidate_version: self.candidate_version.clone(),
            pairs,
        })
    }

    async fn transform(&self, input: ComparisonInput) -> Result<VerificationOutcome> {
        let mut individual = Vec::with_capacity(input.pairs.len() * 2);
        for pair in &input.pairs {
            individual.extend(self.compare.compare_pair(pair));
        }

        let summary = self.compare.summarize(individual);
        let failures = self.compare.failure_lines(&summary);
        let accepted = failures.is_empty();

        let report_inputs = ReportInputs {
            candidate_version: &input.candidate_version,
            reference_version: &input.reference_version,
            summary: &summary,
            tolerances: self.compare.tolerances(),
        };
        let markdown_report = report::render_markdown(&report_inputs);
        let console_report = report::render_console(&report_inputs, self.config.include_passed());
        let csv_export = report::render_csv(&summary)?;

        Ok(VerificationOutcome {
            candidate_version: input.candidate_version,
            summary,
            accepted,
            failures,
            markdown_report,
            console_report,
            csv_export,
        })
    }

    async fn load(&self, outcome: VerificationOutcome) -> Result<String> {
        let report_name = format!("verification_report_v{}.md", outcome.candidate_version);
        let csv_name = format!("individual_results_v{}.csv", outcome.candidate_version);
        let summary_name = format!("verification_summary_v{}.json", outcome.candidate_version);

        let summary_json = serde_json::to_string_pretty(&outcome.summary)?;

        self.storage
            .write_file(&report_name, outcome.markdown_report.as_bytes())
            .await?;
        self.storage
            .write_file(&csv_name, outcome.csv_export.as_bytes())
            .await?;
        self.storage
            .write_file(&summary_name, summary_json.as_bytes())
            .await?;

        if self.config.bundle() {
            let bundle_name = format!("verification_bundle_v{}.zip", outcome.candidate_version);
            tracing::debug!("Creating bundle {}", bundle_name);

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file::<_, ()>(report_name.as_str(), FileOptions::default())?;
                zip.write_all(outcome.markdown_report.as_bytes())?;

                zip.start_file::<_, ()>(csv_name.as_str(), FileOptions::default())?;
                zip.write_all(outcome.csv_export.as_bytes())?;

                zip.start_file::<_, ()>(summary_name.as_str(), FileOptions::default())?;
                zip.write_all(summary_json.as_bytes())?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            self.storage.write_file(&bundle_name, &zip_data).await?;
        }

        Ok(format!("{}/{}", self.config.output_path(), report_name))
    }
}
