//! Report and audit-trail files.
//!
//! Every file name carries the report tag, the district and a timestamp to
//! the second, so repeated runs don't overwrite each other.

use chrono::Local;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::domain::Domain;
use crate::error::PipelineError;
use crate::models::AnalysisResult;
use crate::narrative::{Generation, TokenUsage};

/// Saved copy of a generation, for audit.
#[derive(Debug, Serialize)]
pub struct ResponseRecord<'a> {
    pub model: &'a str,
    pub response_text: &'a str,
    pub thinking_text: Option<&'a str>,
    pub token_usage: UsageRecord,
}

/// Token counters as saved in the response record.
///
/// `thinking_tokens` is 0 when no trace came back and `null` otherwise: the
/// service folds reasoning tokens into `completion_tokens` without a
/// separate count.
#[derive(Debug, Serialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub thinking_tokens: Option<u64>,
}

impl UsageRecord {
    fn new(usage: TokenUsage, has_thinking: bool) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total(),
            thinking_tokens: if has_thinking { None } else { Some(0) },
        }
    }
}

impl<'a> From<&'a Generation> for ResponseRecord<'a> {
    fn from(generation: &'a Generation) -> Self {
        Self {
            model: &generation.model,
            response_text: &generation.text,
            thinking_text: generation.thinking.as_deref(),
            token_usage: UsageRecord::new(generation.usage, generation.thinking.is_some()),
        }
    }
}

/// Current local time in the format used in artifact names.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// District name as it appears in file names.
pub fn file_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Writes artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save the model's thinking trace.
    pub fn save_thinking(
        &self,
        domain: &Domain,
        district: &str,
        trace: &str,
    ) -> Result<PathBuf, PipelineError> {
        let name = format!(
            "{}_thinking_{}_{}.txt",
            domain.tag,
            file_slug(district),
            timestamp()
        );
        let path = self.write(&name, trace.as_bytes())?;
        info!("Thinking output saved to {}", path.display());
        Ok(path)
    }

    /// Save the full generation with token usage.
    pub fn save_response(
        &self,
        domain: &Domain,
        district: &str,
        generation: &Generation,
    ) -> Result<PathBuf, PipelineError> {
        let name = format!(
            "{}_response_{}_{}.json",
            domain.tag,
            file_slug(district),
            timestamp()
        );
        let content = to_json(&ResponseRecord::from(generation))?;
        let path = self.write(&name, content.as_bytes())?;
        info!("Full response data saved to {}", path.display());
        Ok(path)
    }

    /// Save the narrative as plain text.
    pub fn save_analysis_text(
        &self,
        domain: &Domain,
        district: &str,
        narrative: &str,
    ) -> Result<PathBuf, PipelineError> {
        let path = self.write(&analysis_name(domain, district, "txt"), narrative.as_bytes())?;
        info!("Analysis saved to {}", path.display());
        Ok(path)
    }

    /// Save the full result envelope as JSON.
    pub fn save_analysis_json(
        &self,
        domain: &Domain,
        district: &str,
        result: &AnalysisResult,
    ) -> Result<PathBuf, PipelineError> {
        let content = to_json(result)?;
        let path = self.write(&analysis_name(domain, district, "json"), content.as_bytes())?;
        info!("Analysis saved to {}", path.display());
        Ok(path)
    }

    fn write(&self, name: &str, content: &[u8]) -> Result<PathBuf, PipelineError> {
        let path = self.dir.join(name);
        let persist_err = |source| PipelineError::Persist {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(persist_err)?;
        let mut file = std::fs::File::create(&path).map_err(persist_err)?;
        file.write_all(content).map_err(persist_err)?;

        Ok(path)
    }
}

fn analysis_name(domain: &Domain, district: &str, extension: &str) -> String {
    format!(
        "nregs_{}_analysis_{}_{}.{}",
        domain.tag,
        file_slug(district),
        timestamp(),
        extension
    )
}

/// Pretty JSON for any serializable value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{INSPECTION, ZERO_MUSTER};
    use std::path::Path;

    fn generation(thinking: Option<&str>) -> Generation {
        Generation {
            model: "test-model".to_string(),
            text: "<analysis>ok</analysis>".to_string(),
            thinking: thinking.map(String::from),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 40,
            },
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("Indore"), "indore");
        assert_eq!(file_slug(" East Nimar "), "east_nimar");
        assert_eq!(file_slug("a/b"), "a_b");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }

    #[test]
    fn test_save_response_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("output"));

        let path = store
            .save_response(&ZERO_MUSTER, "Dhar", &generation(Some("trace")))
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("zero_muster_response_dhar_"));
        assert!(name.ends_with(".json"));

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["model"], "test-model");
        assert_eq!(saved["thinking_text"], "trace");
        assert_eq!(saved["token_usage"]["total_tokens"], 140);
        assert!(saved["token_usage"]["thinking_tokens"].is_null());
    }

    #[test]
    fn test_response_without_trace_has_zero_thinking_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store
            .save_response(&INSPECTION, "Indore", &generation(None))
            .unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["token_usage"]["thinking_tokens"], 0);
        assert!(saved["thinking_text"].is_null());
    }

    #[test]
    fn test_saves_create_directory_and_tagged_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("output");
        let store = ArtifactStore::new(&out);

        store.save_thinking(&INSPECTION, "East Nimar", "thoughts").unwrap();
        store
            .save_analysis_text(&INSPECTION, "East Nimar", "narrative")
            .unwrap();

        let names = file_names(&out);
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("inspection_thinking_east_nimar_"));
        assert!(names[1].starts_with("nregs_inspection_analysis_east_nimar_"));
        assert!(names[1].ends_with(".txt"));
    }

    #[test]
    fn test_write_failure_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = ArtifactStore::new(&blocker);
        let err = store
            .save_analysis_text(&INSPECTION, "Indore", "text")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
    }

    #[test]
    fn test_unserializable_value_is_serialization_error() {
        let mut bad = std::collections::BTreeMap::new();
        bad.insert((1, 2), "non-string key");

        let err = to_json(&bad).unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(_)));
        assert!(err.to_string().starts_with("failed to serialize report"));
    }
}
