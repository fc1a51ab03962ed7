use std::path::{Path, PathBuf};

use crate::core::data::DataManager;
use crate::domain::model::{
    AnalysisRecord, Direction, Method, ResultValues, RunMetadata, VerificationData,
    SUPPORTED_SCHEMA_VERSION,
};
use crate::domain::ports::AnalysisEngine;
use crate::utils::error::{Result, VerifyError};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub methods: Vec<Method>,
    pub max_analyses: Option<usize>,
    pub force_recompute: bool,
}

/// Run the candidate engine over the reference test matrix, caching one
/// result record per analysis.
///
/// Records already cached for this engine version are skipped unless
/// `force_recompute` is set. A failing engine call skips that record and
/// moves on. Returns the number of records actually computed.
pub fn run_analyses<E: AnalysisEngine + ?Sized>(
    engine: &E,
    data: &DataManager,
    source_file: Option<&Path>,
    options: &RunOptions,
) -> Result<usize> {
    let source = match source_file {
        Some(path) if !path.exists() => {
            return Err(VerifyError::MissingReference {
                path: path.display().to_string(),
            });
        }
        Some(path) => data.load_document(path)?,
        None => data.load_reference()?,
    };

    let records = data.filter_analyses(&source, &options.methods, &[], &[]);
    if records.is_empty() {
        tracing::warn!("No analyses match the requested filters");
        return Ok(0);
    }

    tracing::info!(
        "🚀 Running {} ({}) over {} analyses",
        engine.name(),
        engine.version(),
        records.len()
    );

    let limit = options.max_analyses.unwrap_or(records.len());
    let mut run_count = 0;

    for record in &records {
        if run_count >= limit {
            break;
        }

        let key = data.cache_key(record, engine.version())?;

        if !options.force_recompute
            && data.load_cached_checked(&key, &record.analysis_id)?.is_some()
        {
            tracing::debug!("  Skipping (cached): {}", record.analysis_id);
            continue;
        }

        let results = match run_single(engine, record) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("  ❌ {}: {}", record.analysis_id, e);
                continue;
            }
        };

        let result_record = AnalysisRecord {
            results,
            ..record.clone()
        };

        data.save_cached(&key, &result_record)?;
        run_count += 1;
    }

    tracing::info!("✅ Ran {} new analyses", run_count);
    Ok(run_count)
}

/// One record, both directions. The engine reports metres; result documents
/// carry centimetres.
fn run_single<E: AnalysisEngine + ?Sized>(
    engine: &E,
    record: &AnalysisRecord,
) -> Result<ResultValues> {
    let normal_m = engine.displacement(record, Direction::Normal)?;
    let inverse_m = engine.displacement(record, Direction::Inverse)?;

    Ok(ResultValues {
        normal_displacement_cm: normal_m * 100.0,
        inverse_displacement_cm: inverse_m * 100.0,
        kmax: None,
        vs_final_mps: None,
        damping_final: None,
    })
}

/// Gather every cached record for this engine version into the versioned
/// results file, then drop the consumed cache entries.
pub fn collect_results(
    data: &DataManager,
    engine_version: &str,
    methods: &[Method],
) -> Result<PathBuf> {
    let reference = data.load_reference()?;
    let records = data.filter_analyses(&reference, methods, &[], &[]);

    let mut collected = Vec::new();
    let mut consumed_keys = Vec::new();

    for record in &records {
        let key = data.cache_key(record, engine_version)?;
        if let Some(cached) = data.load_cached_checked(&key, &record.analysis_id)? {
            collected.push(cached);
            consumed_keys.push(key);
        }
    }

    if collected.is_empty() {
        return Err(VerifyError::EmptyCache {
            version: engine_version.to_string(),
        });
    }

    let date_extracted = reference
        .metadata
        .date_extracted
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    let document = VerificationData {
        schema_version: SUPPORTED_SCHEMA_VERSION.to_string(),
        metadata: RunMetadata {
            source_program: "candidate".to_string(),
            source_version: Some(engine_version.to_string()),
            date_extracted: Some(date_extracted),
            total_analyses: Some(collected.len()),
            description: Some(format!(
                "Candidate verification results v{}",
                engine_version
            )),
        },
        analyses: collected,
    };

    let output_path = data.save_results(&document, engine_version)?;
    tracing::info!(
        "💾 Saved {} candidate results to {}",
        document.analyses.len(),
        output_path.display()
    );

    let mut deleted = 0usize;
    for key in consumed_keys {
        if data.delete_cached(&key) {
            deleted += 1;
        } else {
            tracing::warn!("Failed to delete cache entry {}", key);
        }
    }
    tracing::info!("🧹 Cleaned up {} cache entries", deleted);

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AnalysisConfig, GroundMotionParameters, SiteParameters,
    };
    use tempfile::TempDir;

    /// Replays the reference displacements with a fixed multiplier, standing
    /// in for the real solvers.
    struct ScaledEngine {
        scale: f64,
    }

    impl AnalysisEngine for ScaledEngine {
        fn name(&self) -> &str {
            "scaled-replay"
        }

        fn version(&self) -> &str {
            "0.0.1"
        }

        fn displacement(&self, record: &AnalysisRecord, direction: Direction) -> Result<f64> {
            Ok(record.results.displacement_cm(direction) / 100.0 * self.scale)
        }
    }

    /// Always errors, for the skip-and-continue path.
    struct BrokenEngine;

    impl AnalysisEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }

        fn version(&self) -> &str {
            "0.0.0"
        }

        fn displacement(&self, record: &AnalysisRecord, _direction: Direction) -> Result<f64> {
            Err(VerifyError::EngineError {
                analysis_id: record.analysis_id.clone(),
                message: "solver did not converge".to_string(),
            })
        }
    }

    fn record(id: &str, method: Method, displacement: f64) -> AnalysisRecord {
        AnalysisRecord {
            analysis_id: id.to_string(),
            ground_motion_parameters: GroundMotionParameters {
                earthquake: "Chi-Chi".to_string(),
                record_station: "TCU065".to_string(),
                target_pga_g: 0.6,
                ground_motion_file: "chichi_tcu065.csv".to_string(),
                description: None,
            },
            analysis: AnalysisConfig { method, mode: None },
            site_parameters: SiteParameters {
                ky_g: 0.12,
                height_m: Some(20.0),
                vs_slope_mps: Some(280.0),
                vs_base_mps: Some(700.0),
                damping_ratio: Some(0.05),
                reference_strain: None,
            },
            results: ResultValues {
                normal_displacement_cm: displacement,
                inverse_displacement_cm: displacement * 0.9,
                kmax: None,
                vs_final_mps: None,
                damping_final: None,
            },
        }
    }

    fn seed_reference(data: &DataManager, records: Vec<AnalysisRecord>) {
        let document = VerificationData {
            schema_version: SUPPORTED_SCHEMA_VERSION.to_string(),
            metadata: RunMetadata {
                source_program: "reference".to_string(),
                source_version: Some("1.1".to_string()),
                date_extracted: Some("2026-08-01".to_string()),
                total_analyses: Some(records.len()),
                description: None,
            },
            analyses: records,
        };
        data.save_document(&document, &data.reference_path()).unwrap();
    }

    #[test]
    fn test_run_caches_results_and_skips_on_rerun() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());
        seed_reference(
            &data,
            vec![
                record("RIGID_001", Method::Rigid, 10.0),
                record("RIGID_002", Method::Rigid, 20.0),
            ],
        );

        let engine = ScaledEngine { scale: 1.0 };
        let options = RunOptions::default();

        let ran = run_analyses(&engine, &data, None, &options).unwrap();
        assert_eq!(ran, 2);

        // Everything is cached now, so a second pass computes nothing.
        let ran_again = run_analyses(&engine, &data, None, &options).unwrap();
        assert_eq!(ran_again, 0);

        let forced = run_analyses(
            &engine,
            &data,
            None,
            &RunOptions {
                force_recompute: true,
                ..RunOptions::default()
            },
        )
        .unwrap();
        assert_eq!(forced, 2);
    }

    #[test]
    fn test_run_respects_method_filter_and_limit() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());
        seed_reference(
            &data,
            vec![
                record("RIGID_001", Method::Rigid, 10.0),
                record("COUPLED_001", Method::Coupled, 5.0),
                record("COUPLED_002", Method::Coupled, 6.0),
            ],
        );

        let engine = ScaledEngine { scale: 1.0 };

        let ran = run_analyses(
            &engine,
            &data,
            None,
            &RunOptions {
                methods: vec![Method::Coupled],
                max_analyses: Some(1),
                ..RunOptions::default()
            },
        )
        .unwrap();
        assert_eq!(ran, 1);
    }

    #[test]
    fn test_engine_failures_are_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());
        seed_reference(&data, vec![record("RIGID_001", Method::Rigid, 10.0)]);

        let ran = run_analyses(&BrokenEngine, &data, None, &RunOptions::default()).unwrap();
        assert_eq!(ran, 0);
    }

    #[test]
    fn test_collect_builds_versioned_file_and_clears_cache() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());
        let records = vec![
            record("RIGID_001", Method::Rigid, 10.0),
            record("RIGID_002", Method::Rigid, 20.0),
        ];
        seed_reference(&data, records.clone());

        let engine = ScaledEngine { scale: 1.01 };
        run_analyses(&engine, &data, None, &RunOptions::default()).unwrap();

        let output = collect_results(&data, engine.version(), &[]).unwrap();
        assert!(output.ends_with("results/candidate_0.0.1_results.json.gz"));

        let collected = data.load_candidate("0.0.1").unwrap();
        assert_eq!(collected.analyses.len(), 2);
        assert_eq!(collected.version_string(), "0.0.1");
        assert_eq!(collected.metadata.total_analyses, Some(2));
        // Engine output, not the reference values.
        let first = &collected.analyses[0];
        assert!((first.results.normal_displacement_cm - 10.1).abs() < 1e-9);

        // Consumed cache entries are gone.
        for record in &records {
            let key = data.cache_key(record, engine.version()).unwrap();
            assert!(data.load_cached(&key).is_none());
        }
    }

    #[test]
    fn test_collect_with_empty_cache_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());
        seed_reference(&data, vec![record("RIGID_001", Method::Rigid, 10.0)]);

        match collect_results(&data, "0.0.1", &[]).unwrap_err() {
            VerifyError::EmptyCache { version } => assert_eq!(version, "0.0.1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_source_file_error() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataManager::new(temp_dir.path());

        let missing = temp_dir.path().join("absent.json.gz");
        let err = run_analyses(
            &ScaledEngine { scale: 1.0 },
            &data,
            Some(&missing),
            &RunOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, VerifyError::MissingReference { .. }));
    }
}
