use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::application::pipeline::{FailurePolicy, PipelineConfig};
use crate::application::ports::Dimensions;
use crate::domain::value_objects::FormatTag;

/// Which staging store backs a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingBackend {
    Memory,
    #[default]
    Disk,
}

impl std::fmt::Display for StagingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingBackend::Memory => write!(f, "memory"),
            StagingBackend::Disk => write!(f, "disk"),
        }
    }
}

impl FromStr for StagingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StagingBackend::Memory),
            "disk" => Ok(StagingBackend::Disk),
            _ => Err(format!("Invalid staging backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: FormatTag,
    /// Requested image size; `None` keeps the native sample size
    pub output_width: Option<u32>,
    pub output_height: Option<u32>,
    pub workers: usize,
    pub staging_backend: StagingBackend,
    pub failure_policy: FailurePolicy,
    pub label_table: Option<PathBuf>,
    pub durable_writes: bool,
}

/// Keys accepted in a TOML config file; all optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: Option<String>,
    output_width: Option<u32>,
    output_height: Option<u32>,
    workers: Option<usize>,
    staging_backend: Option<String>,
    failure_policy: Option<String>,
    label_table: Option<PathBuf>,
    durable_writes: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            format: FormatTag::Etl9g,
            output_width: None,
            output_height: None,
            workers: PipelineConfig::default().workers,
            staging_backend: StagingBackend::Disk,
            failure_policy: FailurePolicy::Abort,
            label_table: None,
            durable_writes: false,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any variable set in the environment on top of `self`
    pub fn with_env_overrides(self) -> Self {
        Self {
            input_dir: std::env::var("INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.input_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.output_dir),
            format: env_parse("ARCHIVE_FORMAT").unwrap_or(self.format),
            output_width: env_parse("OUTPUT_WIDTH").or(self.output_width),
            output_height: env_parse("OUTPUT_HEIGHT").or(self.output_height),
            workers: env_parse("WORKERS").unwrap_or(self.workers),
            staging_backend: env_parse("STAGING_BACKEND").unwrap_or(self.staging_backend),
            failure_policy: env_parse("FAILURE_POLICY").unwrap_or(self.failure_policy),
            label_table: std::env::var("LABEL_TABLE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .or(self.label_table),
            durable_writes: env_parse("DURABLE_WRITES").unwrap_or(self.durable_writes),
        }
    }

    /// Load a TOML config file over the defaults
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {:?}: {}", path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| format!("Invalid config file: {}", e))?;
        let defaults = Self::default();

        Ok(Self {
            input_dir: file.input_dir.unwrap_or(defaults.input_dir),
            output_dir: file.output_dir.unwrap_or(defaults.output_dir),
            format: file
                .format
                .map(|s| s.parse::<FormatTag>())
                .transpose()?
                .unwrap_or(defaults.format),
            output_width: file.output_width,
            output_height: file.output_height,
            workers: file.workers.unwrap_or(defaults.workers),
            staging_backend: file
                .staging_backend
                .map(|s| s.parse::<StagingBackend>())
                .transpose()?
                .unwrap_or(defaults.staging_backend),
            failure_policy: file
                .failure_policy
                .map(|s| s.parse::<FailurePolicy>())
                .transpose()?
                .unwrap_or(defaults.failure_policy),
            label_table: file.label_table,
            durable_writes: file.durable_writes.unwrap_or(defaults.durable_writes),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers < 1 || self.workers > 256 {
            return Err("WORKERS must be between 1 and 256".to_string());
        }

        for (name, value) in [
            ("OUTPUT_WIDTH", self.output_width),
            ("OUTPUT_HEIGHT", self.output_height),
        ] {
            if let Some(v) = value {
                if v < 1 || v > 4096 {
                    return Err(format!("{} must be between 1 and 4096", name));
                }
            }
        }

        if self.output_width.is_some() != self.output_height.is_some() {
            return Err("OUTPUT_WIDTH and OUTPUT_HEIGHT must be set together".to_string());
        }

        if self.input_dir == self.output_dir {
            return Err("INPUT_DIR and OUTPUT_DIR must differ".to_string());
        }

        if !matches!(self.format, FormatTag::Etl8g | FormatTag::Etl9g) {
            return Err(format!(
                "ARCHIVE_FORMAT {} has no built-in record layout (supported: 8g, 9g)",
                self.format
            ));
        }

        Ok(())
    }

    /// Image size to write, given the sample's native size
    pub fn output_size(&self, native: Dimensions) -> Dimensions {
        match (self.output_width, self.output_height) {
            (Some(width), Some(height)) => Dimensions::new(width, height),
            _ => native,
        }
    }

    /// `<output>/<prefix lowercase>.json`, e.g. `output/etl9g.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.json", self.format.file_prefix().to_lowercase()))
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir.join(".staging")
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(self.workers, self.failure_policy)
    }
}
