//! genseo configuration.
//!
//! Loaded from `~/.genseo/config.toml`. Every key is optional; a missing file
//! means built-in defaults. The endpoint is resolved through a chain:
//!
//! 1. `--endpoint <url>` flag
//! 2. `GENSEO_ENDPOINT` env var
//! 3. `endpoint` in the config file
//! 4. `http://localhost:8000/api/mission/stream`

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::mission::classifier::ClassifierKind;
use crate::model::ContentType;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/mission/stream";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid endpoint '{value}': {source}")]
    Endpoint {
        value: String,
        source: url::ParseError,
    },
}

/// genseo configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Mission stream endpoint.
    pub endpoint: Option<String>,

    /// How status messages are mapped onto stages.
    pub classifier: ClassifierKind,

    /// Mission parameters used when not given explicitly.
    pub defaults: MissionDefaults,
}

/// Default mission parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MissionDefaults {
    pub content_type: ContentType,
    pub target_group: String,
    pub language: String,
    pub region: String,
}

impl Default for MissionDefaults {
    fn default() -> Self {
        Self {
            content_type: ContentType::BlogPost,
            target_group: "General Audience".to_string(),
            language: "German".to_string(),
            region: "Germany".to_string(),
        }
    }
}

impl Config {
    /// Load config from `~/.genseo/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The config file path: `~/.genseo/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::home().map(|h| h.join("config.toml"))
    }

    /// genseo's home directory: `~/.genseo/`.
    pub fn home() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".genseo"))
    }

    /// Resolve the stream endpoint from the flag, environment, and file.
    pub fn endpoint(&self, explicit: Option<&str>) -> Result<Url, ConfigError> {
        let from_env = env::var("GENSEO_ENDPOINT").ok().filter(|s| !s.is_empty());
        resolve_endpoint(explicit, from_env.as_deref(), self.endpoint.as_deref())
    }
}

fn resolve_endpoint(
    explicit: Option<&str>,
    from_env: Option<&str>,
    from_file: Option<&str>,
) -> Result<Url, ConfigError> {
    let value = explicit
        .or(from_env)
        .or(from_file)
        .unwrap_or(DEFAULT_ENDPOINT);
    Url::parse(value).map_err(|source| ConfigError::Endpoint {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.defaults.language, "German");
        assert_eq!(config.classifier, ClassifierKind::Keywords);
    }

    #[test]
    fn reads_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
endpoint = "https://pipeline.example/api/mission/stream"
classifier = "step-field"

[defaults]
content-type = "whitepaper"
region = "Austria"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://pipeline.example/api/mission/stream")
        );
        assert_eq!(config.classifier, ClassifierKind::StepField);
        assert_eq!(config.defaults.content_type, ContentType::Whitepaper);
        assert_eq!(config.defaults.region, "Austria");
        // Unset keys keep their defaults.
        assert_eq!(config.defaults.target_group, "General Audience");
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "classifier = \"psychic\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn endpoint_precedence() {
        let url = resolve_endpoint(Some("http://flag/"), Some("http://env/"), Some("http://file/"));
        assert_eq!(url.unwrap().as_str(), "http://flag/");

        let url = resolve_endpoint(None, Some("http://env/"), Some("http://file/"));
        assert_eq!(url.unwrap().as_str(), "http://env/");

        let url = resolve_endpoint(None, None, Some("http://file/"));
        assert_eq!(url.unwrap().as_str(), "http://file/");

        let url = resolve_endpoint(None, None, None);
        assert_eq!(url.unwrap().as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let err = resolve_endpoint(Some("not a url"), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint { .. }));
    }
}
