use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::domain::model::{
    AnalysisConfig, AnalysisRecord, GroundMotionParameters, Method, SiteParameters,
    VerificationData,
};
use crate::utils::error::{Result, VerifyError};
use crate::utils::validation::Validate;

pub const REFERENCE_RESULTS_FILE: &str = "reference_results.json.gz";

/// Owns the verification data layout: versioned result documents under
/// `results/` and per-analysis engine output under `cache/`.
#[derive(Debug, Clone)]
pub struct DataManager {
    data_dir: PathBuf,
}

impl DataManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn reference_path(&self) -> PathBuf {
        self.results_dir().join(REFERENCE_RESULTS_FILE)
    }

    /// Version string goes into the filename verbatim, periods included.
    pub fn candidate_path(&self, version: &str) -> PathBuf {
        self.results_dir()
            .join(format!("candidate_{}_results.json.gz", version))
    }

    pub fn report_path(&self, version: &str) -> PathBuf {
        self.results_dir()
            .join(format!("verification_report_v{}.md", version))
    }

    pub fn load_reference(&self) -> Result<VerificationData> {
        let path = self.reference_path();
        if !path.exists() {
            return Err(VerifyError::MissingReference {
                path: path.display().to_string(),
            });
        }
        self.load_document(&path)
    }

    pub fn load_candidate(&self, version: &str) -> Result<VerificationData> {
        let path = self.candidate_path(version);
        if !path.exists() {
            return Err(VerifyError::MissingResults {
                version: version.to_string(),
                path: path.display().to_string(),
            });
        }
        self.load_document(&path)
    }

    /// Read a results document, gzip-compressed or plain JSON by extension,
    /// and validate it against the schema.
    pub fn load_document(&self, path: &Path) -> Result<VerificationData> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let data: VerificationData = if path.extension().is_some_and(|ext| ext == "gz") {
            serde_json::from_reader(GzDecoder::new(reader))?
        } else {
            serde_json::from_reader(reader)?
        };

        data.validate()?;
        Ok(data)
    }

    /// Save a results document as `candidate_{version}_results.json.gz`.
    pub fn save_results(&self, data: &VerificationData, version: &str) -> Result<PathBuf> {
        let path = self.candidate_path(version);
        self.save_document(data, &path)?;
        Ok(path)
    }

    /// Save a results document to an explicit path (gzip JSON).
    pub fn save_document(&self, data: &VerificationData, path: &Path) -> Result<()> {
        data.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        write_gz_json(path, data)
    }

    fn cache_file(&self, key: &str) -> PathBuf {
        self.cache_dir().join(format!("{}.json.gz", key))
    }

    /// Load one cached engine result. Corrupted entries are treated as
    /// absent so a damaged cache never blocks a run.
    pub fn load_cached(&self, key: &str) -> Option<AnalysisRecord> {
        let path = self.cache_file(key);
        let file = File::open(path).ok()?;
        serde_json::from_reader(GzDecoder::new(BufReader::new(file))).ok()
    }

    /// Load a cached result and confirm it belongs to the requesting record.
    pub fn load_cached_checked(
        &self,
        key: &str,
        expected_id: &str,
    ) -> Result<Option<AnalysisRecord>> {
        match self.load_cached(key) {
            None => Ok(None),
            Some(record) if record.analysis_id == expected_id => Ok(Some(record)),
            Some(record) => Err(VerifyError::StaleCache {
                key: key.to_string(),
                message: format!(
                    "cached analysis_id {} does not match requested {}",
                    record.analysis_id, expected_id
                ),
            }),
        }
    }

    pub fn save_cached(&self, key: &str, record: &AnalysisRecord) -> Result<()> {
        record.validate()?;

        let cache_dir = self.cache_dir();
        fs::create_dir_all(&cache_dir)?;

        write_gz_json(&self.cache_file(key), record)
    }

    /// Remove one cache entry; false when it was already gone.
    pub fn delete_cached(&self, key: &str) -> bool {
        fs::remove_file(self.cache_file(key)).is_ok()
    }

    /// Deterministic cache key from the analysis inputs and engine version.
    pub fn cache_key(&self, record: &AnalysisRecord, engine_version: &str) -> Result<String> {
        #[derive(Serialize)]
        struct CacheKeyInput<'a> {
            analysis_id: &'a str,
            ground_motion_parameters: &'a GroundMotionParameters,
            analysis: &'a AnalysisConfig,
            site_parameters: &'a SiteParameters,
            engine_version: &'a str,
        }

        let canonical = serde_json::to_string(&CacheKeyInput {
            analysis_id: &record.analysis_id,
            ground_motion_parameters: &record.ground_motion_parameters,
            analysis: &record.analysis,
            site_parameters: &record.site_parameters,
            engine_version,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        Ok(digest[..16].to_string())
    }

    /// Filter records by method, earthquake name or analysis id.
    pub fn filter_analyses(
        &self,
        data: &VerificationData,
        methods: &[Method],
        earthquakes: &[String],
        analysis_ids: &[String],
    ) -> Vec<AnalysisRecord> {
        data.analyses
            .iter()
            .filter(|record| methods.is_empty() || methods.contains(&record.analysis.method))
            .filter(|record| {
                earthquakes.is_empty()
                    || earthquakes.contains(&record.ground_motion_parameters.earthquake)
            })
            .filter(|record| {
                analysis_ids.is_empty() || analysis_ids.contains(&record.analysis_id)
            })
            .cloned()
            .collect()
    }
}

fn write_gz_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer_pretty(&mut encoder, value)?;
    encoder.finish()?;
    Ok(())
}
