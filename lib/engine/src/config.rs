use crate::overrides::KeywordOverride;
use kbquery_core::{Error, FilterConfig, KeywordTables, RecordSchema, Result};
use kbquery_similarity::{IndexKind, Metric, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NO_MATCH_MESSAGE: &str = "관련된 정보를 찾을 수 없어요. 다른 질문을 해보세요!";
pub const DEFAULT_LOW_CONFIDENCE_MESSAGE: &str = "잘 이해되지 않아요. 다시 질문해 주세요!";

/// Fallback texts shown for the two non-answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub no_match: String,
    pub low_confidence: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_match: DEFAULT_NO_MATCH_MESSAGE.to_string(),
            low_confidence: DEFAULT_LOW_CONFIDENCE_MESSAGE.to_string(),
        }
    }
}

/// Everything that shapes query resolution for one knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub metric: Metric,
    /// Scores worse than this become `LowConfidence`; a score exactly at the
    /// threshold still answers.
    pub threshold: f32,
    pub top_pool_size: usize,
    /// Defaults to the metric's own epsilon
    pub tie_epsilon: Option<f32>,
    pub index: IndexKind,
    #[serde(flatten)]
    pub filters: FilterConfig,
    pub schema: RecordSchema,
    pub keywords: KeywordTables,
    pub overrides: Vec<KeywordOverride>,
    /// Put exact ties in id order instead of load order
    pub tie_break_by_id: bool,
    /// Display field printed for an answer; the search sentence when unset
    pub answer_field: Option<String>,
    pub messages: Messages,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_metric(Metric::default())
    }
}

impl EngineConfig {
    /// Defaults with the metric's standard threshold.
    pub fn for_metric(metric: Metric) -> Self {
        Self {
            metric,
            threshold: metric.default_threshold(),
            top_pool_size: 1,
            tie_epsilon: None,
            index: IndexKind::default(),
            filters: FilterConfig::default(),
            schema: RecordSchema::default(),
            keywords: KeywordTables::default(),
            overrides: Vec::new(),
            tie_break_by_id: false,
            answer_field: None,
            messages: Messages::default(),
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn tie_epsilon(&self) -> f32 {
        self.tie_epsilon
            .unwrap_or_else(|| self.metric.default_tie_epsilon())
    }

    pub fn selector(&self) -> Result<Selector> {
        Selector::new(self.top_pool_size, self.threshold, self.tie_epsilon())
    }

    pub fn validate(&self) -> Result<()> {
        self.selector()?;
        if self.schema.id_field.trim().is_empty() {
            return Err(Error::InvalidConfig("schema id_field is empty".to_string()));
        }
        if self.schema.template.fields().next().is_none() {
            return Err(Error::InvalidConfig(
                "search template names no field".to_string(),
            ));
        }
        if let Some(i) = self.overrides.iter().position(|o| o.keywords.iter().all(|k| k.is_empty())) {
            return Err(Error::InvalidConfig(format!("override #{} has no keyword", i + 1)));
        }
        if let Some(vocab) = self.keywords.fields.iter().find(|v| v.name.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "field vocabulary with values {:?} has no name",
                vocab.values
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool: usize) -> Self {
        self.top_pool_size = pool;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_metric_defaults() {
        let distance = EngineConfig::for_metric(Metric::SquaredEuclidean);
        assert_eq!(distance.threshold, 500.0);
        assert_eq!(distance.tie_epsilon(), 1e-3);
        assert_eq!(distance.top_pool_size, 1);

        let cosine = EngineConfig::for_metric(Metric::Cosine);
        assert_eq!(cosine.threshold, 0.45);
        assert_eq!(cosine.tie_epsilon(), 1e-6);
        assert!(cosine.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EngineConfig::default().with_pool_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidPoolSize(0))));

        let config = EngineConfig::default().with_threshold(f32::INFINITY);
        assert!(matches!(config.validate(), Err(Error::InvalidThreshold(_))));

        let mut config = EngineConfig::default();
        config.tie_epsilon = Some(-0.5);
        assert!(matches!(config.validate(), Err(Error::InvalidEpsilon(_))));

        let mut config = EngineConfig::default();
        config.overrides.push(KeywordOverride::new(
            crate::OverrideTrigger::BeforeRetrieval,
            Vec::<String>::new(),
            "x",
        ));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "metric": "cosine",
                "threshold": 0.3,
                "top_pool_size": 5,
                "exclude_shown": true,
                "index": "matrix",
                "schema": {{"id_field": "question", "template": "{{question}}"}},
                "keywords": {{"regions": ["서구", "강서구"]}},
                "overrides": [{{"keywords": ["면적"], "reply": "770km²"}}]
            }}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.metric, Metric::Cosine);
        assert!((config.threshold - 0.3).abs() < 1e-6);
        assert_eq!(config.top_pool_size, 5);
        assert!(config.filters.exclude_shown);
        assert!(config.filters.region);
        assert_eq!(config.index, IndexKind::Matrix);
        assert_eq!(config.schema.id_field, "question");
        assert_eq!(config.keywords.regions.len(), 2);
        assert_eq!(config.overrides.len(), 1);
        assert_eq!(config.messages, Messages::default());
    }

    #[test]
    fn test_from_json_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top_pool_size": 0}}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(Error::InvalidPoolSize(0))
        ));

        let missing = EngineConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
