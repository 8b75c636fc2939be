//! Engine configuration.
//!
//! TOML-backed with a patch-merge load path: defaults, then an optional
//! config file (explicit path, else `QFUSE_CONFIG`), then `QFUSE_*`
//! environment overrides. Every section is optional in the file; absent
//! fields keep their defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QfError, Result};
use crate::filter::FilterParams;
use crate::fusion::FusionParams;
use crate::judge::HttpJudgeConfig;
use crate::merge::MergeParams;
use crate::merge::quota::{AdaptiveQuotaParams, MergeQuota, MergeStrategy};
use crate::retry::RetryConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
}

impl Config {
    /// Load configuration: defaults, then the TOML file at `explicit_path`
    /// (falling back to `QFUSE_CONFIG`), then environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("QFUSE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(QfError::MissingConfig(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| QfError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| QfError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.fusion {
            self.fusion.merge(patch);
        }
        if let Some(patch) = patch.merge {
            self.merge.merge(patch);
        }
        if let Some(patch) = patch.filter {
            self.filter.merge(patch);
        }
        if let Some(patch) = patch.judge {
            self.judge.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_f64("QFUSE_RRF_K")? {
            self.fusion.rrf_k = value;
        }
        if let Some(value) = env_f64("QFUSE_VECTOR_WEIGHT")? {
            self.fusion.vector_weight = value;
        }
        if let Some(value) = env_f64("QFUSE_LEXICAL_WEIGHT")? {
            self.fusion.lexical_weight = value;
        }
        if let Some(value) = env_f64("QFUSE_SALVAGE_FACTOR")? {
            self.fusion.salvage_factor = value;
        }

        if let Some(value) = env_string("QFUSE_MERGE_STRATEGY") {
            self.merge.strategy = value;
        }
        if let Some(value) = env_usize("QFUSE_MAX_RESULTS")? {
            self.merge.max_results = value;
        }
        if let Some(value) = env_f64("QFUSE_SCORE_THRESHOLD")? {
            self.merge.final_score_threshold = value;
        }

        if let Some(value) = env_usize("QFUSE_MAX_WORKERS")? {
            self.filter.max_workers = value;
        }
        if let Some(value) = env_u64("QFUSE_CALL_TIMEOUT_SECS")? {
            self.filter.per_call_timeout_secs = value;
        }
        if let Some(value) = env_u32("QFUSE_MAX_RETRIES")? {
            self.filter.max_retries = value;
        }
        if let Some(value) = env_f64("QFUSE_CRITICAL_FAILURE_RATIO")? {
            self.filter.critical_failure_ratio = value;
        }
        if let Some(value) = env_usize("QFUSE_CACHE_CAPACITY")? {
            self.filter.cache_capacity = value;
        }

        if let Some(value) = env_string("QFUSE_JUDGE_ENDPOINT") {
            self.judge.endpoint = value;
        }
        if let Some(value) = env_string("QFUSE_JUDGE_MODEL") {
            self.judge.model = value;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.fusion.rrf_k <= 0.0 {
            return Err(QfError::Config(format!(
                "fusion.rrf_k must be positive, got {}",
                self.fusion.rrf_k
            )));
        }
        if self.fusion.vector_weight < 0.0 || self.fusion.lexical_weight < 0.0 {
            return Err(QfError::Config(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        if MergeStrategy::from_str(&self.merge.strategy).is_none() {
            return Err(QfError::Config(format!(
                "unknown merge strategy: {} (expected fixed|adaptive)",
                self.merge.strategy
            )));
        }
        if !(0.0..=1.0).contains(&self.filter.critical_failure_ratio) {
            return Err(QfError::Config(format!(
                "filter.critical_failure_ratio must be in [0, 1], got {}",
                self.filter.critical_failure_ratio
            )));
        }
        Ok(())
    }

    pub fn fusion_params(&self) -> FusionParams {
        FusionParams {
            k: self.fusion.rrf_k,
            vector_weight: self.fusion.vector_weight,
            lexical_weight: self.fusion.lexical_weight,
            salvage_factor: self.fusion.salvage_factor,
            min_dense_score: self.fusion.min_dense_score,
        }
    }

    pub fn merge_params(&self) -> MergeParams {
        // validate() already rejected unknown strategies.
        let strategy = MergeStrategy::from_str(&self.merge.strategy).unwrap_or_default();
        MergeParams {
            strategy,
            quota: MergeQuota {
                primary_count: self.merge.primary_count,
                secondary_count: self.merge.secondary_count,
                overflow_count: self.merge.overflow_count,
            },
            adaptive: AdaptiveQuotaParams {
                dominance_ratio: self.merge.dominance_ratio,
                dominance_floor: self.merge.dominance_floor,
                primary_boost: self.merge.primary_boost,
                secondary_damp: self.merge.secondary_damp,
            },
            max_results: self.merge.max_results,
        }
    }

    /// Filter parameters for a judge model, applying the model-override
    /// table: exact name match first, else the longest prefix match.
    pub fn filter_params(&self, model: &str) -> FilterParams {
        let base = FilterParams {
            max_workers: self.filter.max_workers,
            per_call_timeout: Duration::from_secs(self.filter.per_call_timeout_secs),
            max_retries: self.filter.max_retries,
            critical_failure_ratio: self.filter.critical_failure_ratio,
        };

        let Some(over) = self.filter.resolve_override(model) else {
            return base;
        };

        FilterParams {
            max_workers: over.max_workers.unwrap_or(base.max_workers),
            per_call_timeout: over
                .per_call_timeout_secs
                .map_or(base.per_call_timeout, Duration::from_secs),
            ..base
        }
    }

    pub fn judge_http_config(&self) -> HttpJudgeConfig {
        HttpJudgeConfig {
            endpoint: self.judge.endpoint.clone(),
            model: self.judge.model.clone(),
            request_timeout: Duration::from_secs(self.judge.request_timeout_secs),
            retry: RetryConfig {
                max_attempts: self.judge.retry_max_attempts,
                initial_delay: Duration::from_millis(self.judge.retry_initial_delay_ms),
                max_delay: Duration::from_millis(self.judge.retry_max_delay_ms),
                ..RetryConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub rrf_k: f64,
    #[serde(default)]
    pub vector_weight: f64,
    #[serde(default)]
    pub lexical_weight: f64,
    /// Fraction of the raw lexical score used as a salvage floor for
    /// candidates without a valid dense score.
    #[serde(default)]
    pub salvage_factor: f64,
    /// Dense scores at or below this are treated as missing.
    #[serde(default)]
    pub min_dense_score: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            vector_weight: 0.7,
            lexical_weight: 0.3,
            salvage_factor: 0.1,
            min_dense_score: 1e-6,
        }
    }
}

impl FusionConfig {
    fn merge(&mut self, patch: FusionPatch) {
        if let Some(value) = patch.rrf_k {
            self.rrf_k = value;
        }
        if let Some(value) = patch.vector_weight {
            self.vector_weight = value;
        }
        if let Some(value) = patch.lexical_weight {
            self.lexical_weight = value;
        }
        if let Some(value) = patch.salvage_factor {
            self.salvage_factor = value;
        }
        if let Some(value) = patch.min_dense_score {
            self.min_dense_score = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// "fixed" or "adaptive".
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub primary_count: usize,
    #[serde(default)]
    pub secondary_count: usize,
    #[serde(default)]
    pub overflow_count: usize,
    #[serde(default)]
    pub max_results: usize,
    /// Candidates below this fused score are dropped between merge and
    /// evidence filtering. 0.0 disables the threshold.
    #[serde(default)]
    pub final_score_threshold: f64,
    #[serde(default)]
    pub dominance_ratio: f64,
    #[serde(default)]
    pub dominance_floor: f64,
    #[serde(default)]
    pub primary_boost: f64,
    #[serde(default)]
    pub secondary_damp: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        let adaptive = AdaptiveQuotaParams::default();
        let quota = MergeQuota::default();
        Self {
            strategy: MergeStrategy::Fixed.as_str().to_string(),
            primary_count: quota.primary_count,
            secondary_count: quota.secondary_count,
            overflow_count: quota.overflow_count,
            max_results: 50,
            final_score_threshold: 0.0,
            dominance_ratio: adaptive.dominance_ratio,
            dominance_floor: adaptive.dominance_floor,
            primary_boost: adaptive.primary_boost,
            secondary_damp: adaptive.secondary_damp,
        }
    }
}

impl MergeConfig {
    fn merge(&mut self, patch: MergePatch) {
        if let Some(value) = patch.strategy {
            self.strategy = value;
        }
        if let Some(value) = patch.primary_count {
            self.primary_count = value;
        }
        if let Some(value) = patch.secondary_count {
            self.secondary_count = value;
        }
        if let Some(value) = patch.overflow_count {
            self.overflow_count = value;
        }
        if let Some(value) = patch.max_results {
            self.max_results = value;
        }
        if let Some(value) = patch.final_score_threshold {
            self.final_score_threshold = value;
        }
        if let Some(value) = patch.dominance_ratio {
            self.dominance_ratio = value;
        }
        if let Some(value) = patch.dominance_floor {
            self.dominance_floor = value;
        }
        if let Some(value) = patch.primary_boost {
            self.primary_boost = value;
        }
        if let Some(value) = patch.secondary_damp {
            self.secondary_damp = value;
        }
    }
}

/// Per-model override of worker count and call timeout. Some judge models
/// need gentler concurrency and a longer deadline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOverride {
    pub max_workers: Option<usize>,
    pub per_call_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub max_workers: usize,
    #[serde(default)]
    pub per_call_timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub critical_failure_ratio: f64,
    #[serde(default)]
    pub cache_capacity: usize,
    /// Keyed by model name; prefix keys match model families, e.g.
    /// "slow-judge" matches "slow-judge-v2".
    #[serde(default)]
    pub model_overrides: HashMap<String, ModelOverride>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            per_call_timeout_secs: 30,
            max_retries: 1,
            critical_failure_ratio: 0.5,
            cache_capacity: crate::filter::DEFAULT_CACHE_CAPACITY,
            model_overrides: HashMap::new(),
        }
    }
}

impl FilterConfig {
    fn merge(&mut self, patch: FilterPatch) {
        if let Some(value) = patch.max_workers {
            self.max_workers = value;
        }
        if let Some(value) = patch.per_call_timeout_secs {
            self.per_call_timeout_secs = value;
        }
        if let Some(value) = patch.max_retries {
            self.max_retries = value;
        }
        if let Some(value) = patch.critical_failure_ratio {
            self.critical_failure_ratio = value;
        }
        if let Some(value) = patch.cache_capacity {
            self.cache_capacity = value;
        }
        if let Some(overrides) = patch.model_overrides {
            self.model_overrides.extend(overrides);
        }
    }

    fn resolve_override(&self, model: &str) -> Option<&ModelOverride> {
        if let Some(exact) = self.model_overrides.get(model) {
            return Some(exact);
        }
        self.model_overrides
            .iter()
            .filter(|(key, _)| model.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, over)| over)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry_max_attempts: u32,
    #[serde(default)]
    pub retry_initial_delay_ms: u64,
    #[serde(default)]
    pub retry_max_delay_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/v1/judge".to_string(),
            model: "default".to_string(),
            request_timeout_secs: 30,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

impl JudgeConfig {
    fn merge(&mut self, patch: JudgePatch) {
        if let Some(value) = patch.endpoint {
            self.endpoint = value;
        }
        if let Some(value) = patch.model {
            self.model = value;
        }
        if let Some(value) = patch.request_timeout_secs {
            self.request_timeout_secs = value;
        }
        if let Some(value) = patch.retry_max_attempts {
            self.retry_max_attempts = value;
        }
        if let Some(value) = patch.retry_initial_delay_ms {
            self.retry_initial_delay_ms = value;
        }
        if let Some(value) = patch.retry_max_delay_ms {
            self.retry_max_delay_ms = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub fusion: Option<FusionPatch>,
    pub merge: Option<MergePatch>,
    pub filter: Option<FilterPatch>,
    pub judge: Option<JudgePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FusionPatch {
    pub rrf_k: Option<f64>,
    pub vector_weight: Option<f64>,
    pub lexical_weight: Option<f64>,
    pub salvage_factor: Option<f64>,
    pub min_dense_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MergePatch {
    pub strategy: Option<String>,
    pub primary_count: Option<usize>,
    pub secondary_count: Option<usize>,
    pub overflow_count: Option<usize>,
    pub max_results: Option<usize>,
    pub final_score_threshold: Option<f64>,
    pub dominance_ratio: Option<f64>,
    pub dominance_floor: Option<f64>,
    pub primary_boost: Option<f64>,
    pub secondary_damp: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FilterPatch {
    pub max_workers: Option<usize>,
    pub per_call_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub critical_failure_ratio: Option<f64>,
    pub cache_capacity: Option<usize>,
    pub model_overrides: Option<HashMap<String, ModelOverride>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JudgePatch {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub retry_initial_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|err| QfError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| QfError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| QfError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|err| QfError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn config_default_matches_engine_defaults() {
        let config = Config::default();
        assert!((config.fusion.rrf_k - 60.0).abs() < f64::EPSILON);
        assert!((config.fusion.vector_weight - 0.7).abs() < f64::EPSILON);
        assert!((config.fusion.lexical_weight - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.merge.strategy, "fixed");
        assert_eq!(config.merge.max_results, 50);
        assert_eq!(config.filter.max_workers, 4);
        assert!((config.filter.critical_failure_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.merge.strategy, config.merge.strategy);
        assert_eq!(back.filter.max_workers, config.filter.max_workers);
    }

    // =========================================================================
    // File loading and patch merge
    // =========================================================================

    #[test]
    fn load_partial_toml_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qfuse.toml");
        std::fs::write(
            &path,
            r#"
[fusion]
vector_weight = 0.9
lexical_weight = 0.1

[merge]
strategy = "adaptive"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert!((config.fusion.vector_weight - 0.9).abs() < f64::EPSILON);
        assert!((config.fusion.rrf_k - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.merge.strategy, "adaptive");
        assert_eq!(config.merge.max_results, 50);
    }

    #[test]
    fn load_missing_explicit_path_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/qfuse.toml"))).unwrap_err();
        assert!(matches!(err, QfError::MissingConfig(_)));
    }

    #[test]
    fn load_invalid_toml_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qfuse.toml");
        std::fs::write(&path, "not toml [[[").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn unknown_strategy_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qfuse.toml");
        std::fs::write(&path, "[merge]\nstrategy = \"roulette\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("unknown merge strategy"));
    }

    #[test]
    fn negative_rrf_k_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qfuse.toml");
        std::fs::write(&path, "[fusion]\nrrf_k = -1.0\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    // =========================================================================
    // Parameter conversion
    // =========================================================================

    #[test]
    fn fusion_params_mirror_config() {
        let config = Config::default();
        let params = config.fusion_params();
        assert!((params.k - 60.0).abs() < f64::EPSILON);
        assert!((params.salvage_factor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_params_carry_quota_and_adaptive_knobs() {
        let mut config = Config::default();
        config.merge.strategy = "adaptive".to_string();
        config.merge.primary_count = 8;

        let params = config.merge_params();

        assert_eq!(params.strategy, MergeStrategy::Adaptive);
        assert_eq!(params.quota.primary_count, 8);
        assert!((params.adaptive.dominance_ratio - 1.2).abs() < f64::EPSILON);
    }

    // =========================================================================
    // Model overrides
    // =========================================================================

    #[test]
    fn filter_params_without_override_use_base() {
        let config = Config::default();
        let params = config.filter_params("any-model");
        assert_eq!(params.max_workers, 4);
        assert_eq!(params.per_call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn exact_model_override_wins() {
        let mut config = Config::default();
        config.filter.model_overrides.insert(
            "slow-judge-v2".to_string(),
            ModelOverride {
                max_workers: Some(1),
                per_call_timeout_secs: Some(120),
            },
        );

        let params = config.filter_params("slow-judge-v2");

        assert_eq!(params.max_workers, 1);
        assert_eq!(params.per_call_timeout, Duration::from_secs(120));
        // Fields outside the override keep base values.
        assert_eq!(params.max_retries, 1);
    }

    #[test]
    fn prefix_override_matches_model_family() {
        let mut config = Config::default();
        config.filter.model_overrides.insert(
            "slow-judge".to_string(),
            ModelOverride {
                max_workers: Some(2),
                per_call_timeout_secs: None,
            },
        );

        let params = config.filter_params("slow-judge-v3-preview");

        assert_eq!(params.max_workers, 2);
        assert_eq!(params.per_call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn longest_prefix_wins() {
        let mut config = Config::default();
        config.filter.model_overrides.insert(
            "judge".to_string(),
            ModelOverride {
                max_workers: Some(8),
                per_call_timeout_secs: None,
            },
        );
        config.filter.model_overrides.insert(
            "judge-large".to_string(),
            ModelOverride {
                max_workers: Some(2),
                per_call_timeout_secs: None,
            },
        );

        assert_eq!(config.filter_params("judge-large-v1").max_workers, 2);
        assert_eq!(config.filter_params("judge-small").max_workers, 8);
    }

    #[test]
    fn model_overrides_load_from_toml_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qfuse.toml");
        std::fs::write(
            &path,
            r#"
[filter.model_overrides.careful-model]
max_workers = 1
per_call_timeout_secs = 90
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let params = config.filter_params("careful-model");

        assert_eq!(params.max_workers, 1);
        assert_eq!(params.per_call_timeout, Duration::from_secs(90));
    }

    // =========================================================================
    // Judge config
    // =========================================================================

    #[test]
    fn judge_http_config_conversion() {
        let mut config = Config::default();
        config.judge.endpoint = "http://judge.internal/v1".to_string();
        config.judge.retry_max_attempts = 5;

        let http = config.judge_http_config();

        assert_eq!(http.endpoint, "http://judge.internal/v1");
        assert_eq!(http.retry.max_attempts, 5);
        assert_eq!(http.request_timeout, Duration::from_secs(30));
    }
}
