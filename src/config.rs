//! Settings for downloaders.
//!
//! Read from an optional configuration file (any format the `config` crate knows,
//! TOML usually) and overridden by `BIBFETCH_*` environment variables, with `__`
//! separating nested keys (`BIBFETCH_AUTHORS__SEPARATOR`):
//!
//! ```toml
//! user-agent = "Mozilla/5.0 (X11; Linux x86_64)"
//! downloader-proxy = "http://proxy:8080"
//! timeout = 30
//! max-document-mb = 100
//!
//! [authors]
//! separator = " and "
//! format = "{family}, {given}"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{author::AuthorFormat, error::Result};

const ENV_PREFIX: &str = "BIBFETCH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Sent as `User-Agent` on every request
    #[serde(default = "default_user_agent", alias = "user_agent")]
    pub user_agent: String,

    /// Proxy for both http and https traffic
    #[serde(default, alias = "downloader_proxy")]
    pub downloader_proxy: Option<String>,

    /// Global per-request timeout in seconds; the transport default when unset
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default = "default_max_document_mb", alias = "max_document_mb")]
    pub max_document_mb: u64,

    #[serde(default)]
    pub authors: AuthorFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            downloader_proxy: None,
            timeout: None,
            max_document_mb: default_max_document_mb(),
            authors: AuthorFormat::default(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .convert_case(config::Case::Kebab)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.10 Safari/605.1.1".to_string()
}

fn default_max_document_mb() -> u64 {
    100
}

impl Settings {
    /// Load settings from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder.add_source(env).build()?.try_deserialize()?;
        Ok(settings)
    }

    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_proxy() {
        let settings = Settings::default();
        assert!(settings.downloader_proxy.is_none());
        assert!(settings.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(settings.max_document_bytes(), 100 * 1024 * 1024);
        assert_eq!(settings.authors, AuthorFormat::default());
    }

    #[test]
    fn loads_kebab_case_keys_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tmp file");
        writeln!(
            file,
            r#"
user-agent = "papers/1.0"
downloader-proxy = "http://localhost:3128"
timeout = 12

[authors]
separator = "; "
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).expect("load");
        assert_eq!(settings.user_agent, "papers/1.0");
        assert_eq!(
            settings.downloader_proxy.as_deref(),
            Some("http://localhost:3128")
        );
        assert_eq!(settings.timeout, Some(12));
        assert_eq!(settings.authors.separator, "; ");
        assert_eq!(settings.authors.format, "{family}, {given}");
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        environment().source(Some(vars))
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load_with_env(
            None,
            env(&[
                ("BIBFETCH_USER_AGENT", "envua/1"),
                ("BIBFETCH_DOWNLOADER_PROXY", "http://p:1"),
                ("BIBFETCH_TIMEOUT", "7"),
                ("BIBFETCH_AUTHORS__SEPARATOR", " & "),
            ]),
        )
        .expect("load");
        assert_eq!(settings.user_agent, "envua/1");
        assert_eq!(settings.downloader_proxy.as_deref(), Some("http://p:1"));
        assert_eq!(settings.timeout, Some(7));
        assert_eq!(settings.authors.separator, " & ");
        assert_eq!(settings.authors.format, "{family}, {given}");
        assert_eq!(settings.max_document_mb, 100);
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tmp file");
        writeln!(file, "user-agent = \"from-file\"\ntimeout = 3").unwrap();

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("BIBFETCH_USER_AGENT", "from-env")]),
        )
        .expect("load");
        assert_eq!(settings.user_agent, "from-env");
        assert_eq!(settings.timeout, Some(3));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(path.as_path())).is_err());
    }
}
