use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;

pub const CREDENTIAL_VAR: &str = "GENAI_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "profiler.toml";

const DEFAULT_SITES: &[&str] = &[
    "https://www.goldmansachs.com",
    "https://corporate.exxonmobil.com",
    "https://www.hsbc.com",
    "https://www.volkswagenag.com",
    "https://www.ibm.com",
    "https://www.unilever.com",
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GENAI_API_KEY is not set; add it to the environment or a .env file")]
    MissingCredential,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Append,
    Overwrite,
}

/// What to do with a site whose homepage yields no relevant links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySitePolicy {
    /// Leave the site out of the output table.
    Skip,
    /// Emit a row with every field set to the no-content sentinel.
    Record,
}

/// Model provider credential. `Debug` never prints the value.
#[derive(Clone, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Run configuration, built once at startup and borrowed by every stage.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub sites: Vec<String>,
    pub output: PathBuf,
    pub write_mode: WriteMode,
    pub model: String,
    pub model_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub site_delay_ms: u64,
    pub empty_site_policy: EmptySitePolicy,
    #[serde(skip)]
    pub api_key: ApiKey,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sites: DEFAULT_SITES.iter().map(|s| s.to_string()).collect(),
            output: PathBuf::from("result.csv"),
            write_mode: WriteMode::Append,
            model: "gemini-1.5-flash".into(),
            model_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            request_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.into(),
            max_retries: 3,
            backoff_base_ms: 1000,
            site_delay_ms: 2000,
            empty_site_policy: EmptySitePolicy::Skip,
            api_key: ApiKey::default(),
        }
    }
}

impl Settings {
    /// Layered load: defaults, then the optional TOML file, then `PROFILER_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        Settings::load_from(path, None)
    }

    /// As `load`, reading env vars from `env` instead of the process when given.
    fn load_from(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Settings> {
        let defaults = Settings::default();
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let mut builder = Config::builder()
            .set_default("sites", defaults.sites.clone())?
            .set_default("output", defaults.output.to_string_lossy().to_string())?
            .set_default("write_mode", "append")?
            .set_default("model", defaults.model.clone())?
            .set_default("model_base_url", defaults.model_base_url.clone())?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("user_agent", defaults.user_agent.clone())?
            .set_default("max_retries", defaults.max_retries as i64)?
            .set_default("backoff_base_ms", defaults.backoff_base_ms as i64)?
            .set_default("site_delay_ms", defaults.site_delay_ms as i64)?
            .set_default("empty_site_policy", "skip")?;

        // An explicitly requested file must exist; the default one is optional.
        builder = builder.add_source(File::from(file).required(path.is_some()));
        builder = builder.add_source(
            Environment::with_prefix("PROFILER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sites")
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load settings (file: {})", file.display()))?;
        Ok(settings)
    }

    /// Reads the credential from the environment. Missing or blank is fatal.
    pub fn with_credential_from_env(self) -> Result<Settings, ConfigError> {
        let key = std::env::var(CREDENTIAL_VAR).unwrap_or_default();
        self.with_credential(&key)
    }

    pub fn with_credential(mut self, key: &str) -> Result<Settings, ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        self.api_key = ApiKey::new(key);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid("no sites configured".into()));
        }
        for site in &self.sites {
            match url::Url::parse(site) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "site is not an absolute http(s) URL: {}",
                        site
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn site_delay(&self) -> Duration {
        Duration::from_millis(self.site_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credential_is_rejected() {
        let err = Settings::default().with_credential("   ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));
    }

    #[test]
    fn credential_is_redacted_in_debug() {
        let s = Settings::default().with_credential("secret-key").unwrap();
        assert_eq!(s.api_key.expose(), "secret-key");
        assert!(!format!("{:?}", s).contains("secret-key"));
    }

    #[test]
    fn defaults_cover_standard_batch() {
        let s = Settings::default();
        assert_eq!(s.sites.len(), 6);
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.request_timeout(), Duration::from_secs(10));
        assert_eq!(s.site_delay(), Duration::from_secs(2));
        assert_eq!(s.empty_site_policy, EmptySitePolicy::Skip);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validate_rejects_relative_site_and_zero_retries() {
        let mut s = Settings::default();
        s.sites = vec!["www.example.com".into()];
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(_))));

        let mut s = Settings::default();
        s.max_retries = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiler.toml");
        std::fs::write(
            &path,
            "sites = [\"https://www.boeing.com/company\"]\nwrite_mode = \"overwrite\"\nempty_site_policy = \"record\"\nmax_retries = 5\n",
        )
        .unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.sites, vec!["https://www.boeing.com/company".to_string()]);
        assert_eq!(s.write_mode, WriteMode::Overwrite);
        assert_eq!(s.empty_site_policy, EmptySitePolicy::Record);
        assert_eq!(s.max_retries, 5);
        assert_eq!(s.request_timeout_secs, 10);
    }

    #[test]
    fn env_layer_overrides_file_and_splits_sites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiler.toml");
        std::fs::write(&path, "max_retries = 5\noutput = \"from-file.csv\"\n").unwrap();

        let env: Map<String, String> = [
            ("PROFILER_OUTPUT", "out/env.csv"),
            ("PROFILER_SITES", "https://www.boeing.com/company,https://www.nike.com/about"),
            ("PROFILER_MAX_RETRIES", "4"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let s = Settings::load_from(Some(&path), Some(env)).unwrap();
        assert_eq!(s.output, PathBuf::from("out/env.csv"));
        assert_eq!(
            s.sites,
            vec![
                "https://www.boeing.com/company".to_string(),
                "https://www.nike.com/about".to_string(),
            ]
        );
        assert_eq!(s.max_retries, 4);
        assert_eq!(s.site_delay_ms, 2000);
    }

    #[test]
    fn load_fails_for_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
