//! Loader for Precis configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every section is optional)
//! 2. YAML files and inline YAML snippets, in the order they were attached
//! 3. `PRECIS__SECTION__FIELD` environment variables
//!
//! String values may reference `${VAR}`; references are expanded recursively
//! (bounded) after the merge.
//!
//! ```yaml
//! version: "1"
//! model:
//!   name: gemini-2.5-flash-preview-05-20
//!   timeout_secs: 60
//! pipeline:
//!   source: caption_fetch
//!   max_source_chars: 30000
//! key_store:
//!   path: ~/.local/share/precis/precis.db
//! browser:
//!   webdriver_url: http://localhost:9515
//! logging:
//!   format: json
//! ```
use config::{Config, ConfigError, Environment, File};
use precis_common::ContentSource;
use precis_common::observability::{LogFormat, default_data_dir};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 15_000;
pub const DEFAULT_TRANSCRIPT_SELECTOR: &str =
    "#segments-container .segment .yt-core-attributed-string";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PrecisConfig {
    pub version: Option<String>,
    pub model: ModelSection,
    pub pipeline: PipelineSection,
    pub key_store: KeyStoreSection,
    pub browser: BrowserSection,
    pub logging: LoggingSection,
}

/// Which generative model to call and where.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub name: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub source: ContentSource,
    /// Upper bound on characters of page text sent to the model.
    pub max_source_chars: usize,
    pub transcript_selector: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            source: ContentSource::default(),
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
            transcript_selector: DEFAULT_TRANSCRIPT_SELECTOR.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyStoreSection {
    pub path: Option<String>,
}

impl KeyStoreSection {
    /// SQLite file holding the API key; `~` is expanded.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
            None => default_data_dir("precis").join("precis.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: String,
    pub headless: bool,
    /// Page to open when the session starts.
    pub start_url: Option<String>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.into(),
            headless: false,
            start_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingSection {
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|d| PathBuf::from(shellexpand::tilde(d).into_owned()))
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate wiring (YAML + env overrides).
pub struct PrecisConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PrecisConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PrecisConfigLoader {
    /// Start from defaults; `PRECIS__` env overrides are applied at [`load`](Self::load).
    ///
    /// ```
    /// use precis_config::PrecisConfigLoader;
    ///
    /// let config = PrecisConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.pipeline.max_source_chars, 15_000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent; env-only setups rely on this.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use precis_common::ContentSource;
    /// use precis_config::PrecisConfigLoader;
    ///
    /// let cfg = PrecisConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// pipeline:
    ///   source: direct_url
    /// model:
    ///   name: "gemini-test"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.pipeline.source, ContentSource::DirectUrl);
    /// assert_eq!(cfg.model.name, "gemini-test");
    /// assert_eq!(cfg.model.timeout_secs, 60);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<PrecisConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PRECIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PrecisConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.pipeline.max_source_chars == 0 {
            return Err(ConfigError::Message(
                "pipeline.max_source_chars must be greater than zero".into(),
            ));
        }

        Ok(typed)
    }
}
