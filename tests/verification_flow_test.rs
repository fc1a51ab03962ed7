use slide_verify::domain::model::{
    AnalysisConfig, AnalysisRecord, GroundMotionParameters, Method, ResultValues, RunMetadata,
    SiteParameters, SoilMode, VerificationData,
};
use slide_verify::{
    DataManager, LocalStorage, ToleranceConfig, VerificationPipeline, VerifyConfig, VerifyEngine,
    VerifyError,
};
use std::path::Path;
use tempfile::TempDir;

fn record(id: &str, method: Method, displacement_cm: f64) -> AnalysisRecord {
    AnalysisRecord {
        analysis_id: id.to_string(),
        ground_motion_parameters: GroundMotionParameters {
            earthquake: "Northridge".to_string(),
            record_station: "Sylmar".to_string(),
            target_pga_g: 0.5,
            ground_motion_file: "northridge_sylmar.csv".to_string(),
            description: None,
        },
        analysis: AnalysisConfig {
            method,
            mode: if method.requires_dynamic_response() {
                Some(SoilMode::LinearElastic)
            } else {
                None
            },
        },
        site_parameters: SiteParameters {
            ky_g: 0.15,
            height_m: Some(30.0),
            vs_slope_mps: Some(250.0),
            vs_base_mps: Some(600.0),
            damping_ratio: Some(0.05),
            reference_strain: None,
        },
        results: ResultValues {
            normal_displacement_cm: displacement_cm,
            inverse_displacement_cm: displacement_cm * 0.85,
            kmax: None,
            vs_final_mps: None,
            damping_final: None,
        },
    }
}

fn reference_matrix() -> Vec<AnalysisRecord> {
    let mut records = Vec::new();
    for (prefix, method) in [
        ("RIGID", Method::Rigid),
        ("DECOUPLED", Method::Decoupled),
        ("COUPLED", Method::Coupled),
    ] {
        for i in 0..15 {
            records.push(record(
                &format!("{}_{:03}", prefix, i),
                method,
                1.0 + i as f64 * 2.0,
            ));
        }
    }
    records
}

fn document(source: &str, version: &str, records: Vec<AnalysisRecord>) -> VerificationData {
    VerificationData {
        schema_version: "1.0".to_string(),
        metadata: RunMetadata {
            source_program: source.to_string(),
            source_version: Some(version.to_string()),
            date_extracted: Some("2026-08-01".to_string()),
            total_analyses: Some(records.len()),
            description: None,
        },
        analyses: records,
    }
}

/// Write reference data plus a candidate result set scaled by `bias`.
fn seed(data_dir: &Path, bias: f64) {
    let data = DataManager::new(data_dir);
    let reference = reference_matrix();

    let candidate: Vec<AnalysisRecord> = reference
        .iter()
        .map(|r| {
            let mut c = r.clone();
            c.results.normal_displacement_cm *= bias;
            c.results.inverse_displacement_cm *= bias;
            c
        })
        .collect();

    data.save_document(
        &document("legacy", "1.1", reference),
        &data.reference_path(),
    )
    .unwrap();
    data.save_results(&document("candidate", "0.3.1", candidate), "0.3.1")
        .unwrap();
}

fn verify_config(data_dir: &Path, output_path: &Path) -> VerifyConfig {
    VerifyConfig {
        candidate_version: Some("0.3.1".to_string()),
        config: "verification.toml".to_string(),
        data_dir: data_dir.to_str().unwrap().to_string(),
        output_path: output_path.to_str().unwrap().to_string(),
        methods: vec![],
        candidate_manifest: None,
        include_passed: false,
        bundle: false,
        verbose: false,
        monitor: false,
    }
}

#[tokio::test]
async fn test_end_to_end_acceptance() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    seed(data_dir.path(), 1.001);

    let config = verify_config(data_dir.path(), output_dir.path());
    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(
        storage,
        config,
        ToleranceConfig::default(),
        "0.3.1".to_string(),
    );
    let engine = VerifyEngine::new(pipeline);

    let outcome = engine.run().await.unwrap();
    assert!(outcome.accepted, "failures: {:?}", outcome.failures);
    assert!(outcome.failures.is_empty());
    assert!(outcome.report_path.ends_with("verification_report_v0.3.1.md"));

    // All three artifacts land on disk.
    let report = std::fs::read_to_string(
        output_dir.path().join("verification_report_v0.3.1.md"),
    )
    .unwrap();
    assert!(report.contains("# Verification Report"));
    assert!(report.contains("Candidate version: 0.3.1"));
    assert!(report.contains("Reference version: 1.1"));
    assert!(report.contains("### RIGID Method:"));
    assert!(report.contains("### DECOUPLED Method:"));
    assert!(report.contains("### COUPLED Method:"));
    assert!(!report.contains("❌"));

    assert!(output_dir
        .path()
        .join("individual_results_v0.3.1.csv")
        .exists());
    assert!(output_dir
        .path()
        .join("verification_summary_v0.3.1.json")
        .exists());

    // 45 paired analyses, two directions each.
    let summary: serde_json::Value = serde_json::from_slice(
        &std::fs::read(output_dir.path().join("verification_summary_v0.3.1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["total_tests"], 90);
    assert_eq!(summary["failing_tests"], 0);
}

#[tokio::test]
async fn test_end_to_end_rejection_with_failure_lines() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    seed(data_dir.path(), 1.15);

    let config = verify_config(data_dir.path(), output_dir.path());
    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(
        storage,
        config,
        ToleranceConfig::default(),
        "0.3.1".to_string(),
    );
    let engine = VerifyEngine::new(pipeline);

    let outcome = engine.run().await.unwrap();
    assert!(!outcome.accepted);
    assert!(outcome.failures.iter().any(|f| f.contains("slope")));
    assert!(outcome.failures.iter().any(|f| f.contains("pass rate")));

    // The report is still written so the operator can inspect the failure.
    let report = std::fs::read_to_string(
        output_dir.path().join("verification_report_v0.3.1.md"),
    )
    .unwrap();
    assert!(report.contains("❌"));
    assert!(outcome.console_report.contains("Failed Tests"));
}

#[tokio::test]
async fn test_missing_reference_is_an_operator_error() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let config = verify_config(data_dir.path(), output_dir.path());
    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(
        storage,
        config,
        ToleranceConfig::default(),
        "0.3.1".to_string(),
    );
    let engine = VerifyEngine::new(pipeline);

    match engine.run().await.unwrap_err() {
        VerifyError::MissingReference { path } => {
            assert!(path.contains("reference_results.json.gz"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_candidate_results_names_the_version() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    // Reference only; no candidate result file.
    let data = DataManager::new(data_dir.path());
    data.save_document(
        &document("legacy", "1.1", reference_matrix()),
        &data.reference_path(),
    )
    .unwrap();

    let config = verify_config(data_dir.path(), output_dir.path());
    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(
        storage,
        config,
        ToleranceConfig::default(),
        "0.3.1".to_string(),
    );
    let engine = VerifyEngine::new(pipeline);

    match engine.run().await.unwrap_err() {
        VerifyError::MissingResults { version, .. } => assert_eq!(version, "0.3.1"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_loosened_tolerances_accept_a_biased_candidate() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    seed(data_dir.path(), 1.15);

    let loose = ToleranceConfig::from_toml_str(
        r#"
[tolerances]
default_relative = 0.25
default_absolute = 10.0
percent_passing_individual_tests = 50.0
lin_regression_r_squared_min = 0.9
lin_regression_slope_min = 0.8
lin_regression_slope_max = 1.2
lin_regression_intercept_min = -1.0
lin_regression_intercept_max = 1.0
"#,
    )
    .unwrap();

    let config = verify_config(data_dir.path(), output_dir.path());
    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(storage, config, loose, "0.3.1".to_string());
    let engine = VerifyEngine::new(pipeline);

    let outcome = engine.run().await.unwrap();
    assert!(outcome.accepted, "failures: {:?}", outcome.failures);
}

#[tokio::test]
async fn test_method_filter_restricts_the_run() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    seed(data_dir.path(), 1.001);

    let mut config = verify_config(data_dir.path(), output_dir.path());
    config.methods = vec!["rigid".to_string()];

    let storage = LocalStorage::new(output_dir.path());
    let pipeline = VerificationPipeline::new(
        storage,
        config,
        ToleranceConfig::default(),
        "0.3.1".to_string(),
    );
    let engine = VerifyEngine::new(pipeline);

    let outcome = engine.run().await.unwrap();
    assert!(outcome.accepted);
    // 15 rigid analyses, two directions each.
    assert!(outcome.console_report.contains("Total Tests: 30"));
    assert!(!outcome.console_report.contains("DECOUPLED"));
}
