//! Batch Reports
//!
//! The engine checks one file at a time. Callers that accept several files
//! evaluate each independently and collect the verdicts here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::sha256_hex;
use crate::pipeline::CheckPipeline;
use crate::validation::{Verdict, VerdictStatus};
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVerdict {
    pub filename: String,
    pub sha256: String,
    pub verdict: Verdict,
}

impl FileVerdict {
    pub fn check(pipeline: &CheckPipeline, bytes: &[u8], spec_name: &str, filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            sha256: sha256_hex(bytes),
            verdict: pipeline.evaluate(bytes, spec_name, filename),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub spec: String,
    pub engine_version: String,
    pub generated_at: DateTime<Utc>,
    pub all_passed: bool,
    pub files: Vec<FileVerdict>,
}

impl BatchReport {
    pub fn from_entries(spec: &str, files: Vec<FileVerdict>) -> Self {
        Self {
            spec: spec.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            generated_at: Utc::now(),
            all_passed: !files.is_empty() && files.iter().all(|f| f.verdict.is_pass()),
            files,
        }
    }

    pub fn count(&self, status: VerdictStatus) -> usize {
        self.files.iter().filter(|f| f.verdict.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_aggregates_independent_verdicts() {
        let pipeline = CheckPipeline::default();
        let spec = "Poster (6.00m x 3.00m)";
        let files = vec![
            FileVerdict::check(&pipeline, b"not a pdf", spec, "a.pdf"),
            FileVerdict::check(&pipeline, b"", spec, "b.png"),
        ];
        let report = BatchReport::from_entries(spec, files);

        assert!(!report.all_passed);
        assert_eq!(report.count(VerdictStatus::Fail), 2);
        assert_eq!(report.files[1].sha256.len(), 64);
        assert_eq!(report.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn test_empty_batch_has_not_passed() {
        assert!(!BatchReport::from_entries("x", vec![]).all_passed);
    }
}
