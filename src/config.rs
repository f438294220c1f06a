use crate::analytics::{DeviationAnalysisOptions, FlagThresholds, ValidationPolicy};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default search locations, first match wins
const CONFIG_PATHS: [&str; 2] = ["historian-anomaly.toml", "config/historian-anomaly.toml"];

/// Environment variable prefix (e.g. `ANOMALY__THRESHOLDS__IQR_MULTIPLIER=2.0`)
const ENV_PREFIX: &str = "ANOMALY";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validation: ValidationPolicy,
    pub thresholds: FlagThresholds,
    pub deviation: DeviationAnalysisOptions,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub directory: String,
    /// daily, hourly or never
    pub rotation: String,
    pub console: bool,
    pub file: bool,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            rotation: "daily".to_string(),
            console: true,
            file: false,
            json: false,
        }
    }
}

impl EngineConfig {
    /// 読み込み対象の設定ファイルを解決
    ///
    /// An explicit `path` is returned as is; otherwise the first existing file
    /// among the default locations, if any.
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => CONFIG_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists()),
        }
    }

    /// 設定ファイルを読み込み、環境変数で上書き
    ///
    /// With an explicit `path` the file is required; a default location is
    /// used only when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings =
            config::Config::builder().add_source(config::Config::try_from(&EngineConfig::default())?);

        if let Some(file) = Self::resolve_path(path) {
            settings = settings.add_source(config::File::from(file.as_path()).required(path.is_some()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// サンプル設定ファイルを生成
    pub fn generate_sample_config(output: &Path) -> Result<()> {
        let toml_content = toml::to_string_pretty(&EngineConfig::default())?;

        let sample_content = format!(
            r#"# historian-anomaly configuration
#
# Save as historian-anomaly.toml. Every key can be overridden from the
# environment, e.g. ANOMALY__THRESHOLDS__STATISTICAL_THRESHOLD=2.5

{}
# [validation]
# include_bad_quality       = use samples with Bad quality codes
# include_uncertain_quality = use samples with Uncertain quality codes
#
# [thresholds]
# statistical_threshold = Z-score cutoff, always applied
# iqr_multiplier        = Tukey fence multiplier, always applied
# enable_*              = run the pattern / trend / advanced stages
#
# [log]
# level     = trace, debug, info, warn, error
# rotation  = daily, hourly, never
"#,
            toml_content
        );

        std::fs::write(output, sample_content)?;
        tracing::info!(path = %output.display(), "sample configuration written");
        Ok(())
    }
}
