//! Site configuration.
//!
//! Read from `site.toml` (or the file named by `SITE_CONFIG`), then
//! overridden by environment variables. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::i18n::Language;
use crate::sidebar::{default_sidebar, SidebarItem};

pub const DEFAULT_CONFIG_PATH: &str = "site.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Which of the two sites this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Blog,
    Master,
}

impl Zone {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blog" => Some(Zone::Blog),
            "master" => Some(Zone::Master),
            _ => None,
        }
    }
}

/// Credentials for the hosted post store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub zone: Zone,
    pub site_name: String,
    pub site_url: String,
    /// Where the master zone sends `/blog`.
    pub blog_url: String,
    pub content_dir: PathBuf,
    pub default_language: Language,
    pub categories: Vec<String>,
    pub sidebar: Vec<SidebarItem>,

    #[serde(skip)]
    pub port: u16,
    #[serde(skip)]
    pub is_development: bool,
    #[serde(skip)]
    pub supabase: Option<SupabaseConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            zone: Zone::Blog,
            site_name: "Blog Zone".to_string(),
            site_url: "http://localhost:4000".to_string(),
            blog_url: "http://localhost:4000".to_string(),
            content_dir: PathBuf::from("content"),
            default_language: Language::En,
            categories: [
                "Web Development",
                "React",
                "CSS",
                "Database",
                "Backend",
                "Performance",
                "DevOps",
                "Mobile",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sidebar: default_sidebar(),
            port: 8080,
            is_development: false,
            supabase: None,
        }
    }
}

impl SiteConfig {
    /// Load the config file, apply the process environment and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        self.is_development = lookup("RUST_ENV").is_some_and(|v| v == "development");
        if let Some(zone) = lookup("SITE_ZONE").as_deref().and_then(Zone::parse) {
            self.zone = zone;
        }
        if let Some(url) = lookup("SITE_URL") {
            self.site_url = url;
        }
        if let Some(url) = lookup("BLOG_URL") {
            self.blog_url = url;
        }
        self.supabase = match (lookup("SUPABASE_URL"), lookup("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) if !url.is_empty() && !anon_key.is_empty() => {
                Some(SupabaseConfig { url, anon_key })
            }
            _ => None,
        };
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [("site_url", &self.site_url), ("blog_url", &self.blog_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "`{name}` must be an http(s) URL, got `{url}`"
                )));
            }
        }
        Ok(())
    }

    /// Site URL without a trailing slash, for building absolute links.
    pub fn base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.content_dir.join("docs")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.content_dir.join("static")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_partial_toml_over_defaults() {
        let config = SiteConfig::from_toml(
            r#"
zone = "master"
site_name = "Master Zone"
default_language = "vi"

[[sidebar]]
type = "link"
label = "Home"
href = "/docs/intro"
"#,
        )
        .unwrap();

        assert_eq!(config.zone, Zone::Master);
        assert_eq!(config.site_name, "Master Zone");
        assert_eq!(config.default_language, Language::Vi);
        assert_eq!(config.sidebar.len(), 1);
        assert_eq!(config.categories.len(), 8);
        assert_eq!(config.content_dir, PathBuf::from("content"));
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = SiteConfig::from_file(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.zone, Zone::Blog);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("RUST_ENV", "development"),
            ("SITE_ZONE", "Master"),
            ("BLOG_URL", "https://blog.example.com"),
            ("SUPABASE_URL", "https://db.example.com"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 9000);
        assert!(config.is_development);
        assert_eq!(config.zone, Zone::Master);
        assert_eq!(config.blog_url, "https://blog.example.com");
        assert_eq!(
            config.supabase,
            Some(SupabaseConfig {
                url: "https://db.example.com".into(),
                anon_key: "anon".into()
            })
        );
    }

    #[test]
    fn supabase_needs_both_values() {
        let mut config = SiteConfig::default();
        config.apply_env(|key| (key == "SUPABASE_URL").then(|| "https://db.example.com".into()));
        assert!(config.supabase.is_none());
    }

    #[test]
    fn rejects_non_http_urls() {
        let config = SiteConfig {
            blog_url: "localhost:4000".into(),
            ..SiteConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blog_url"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = SiteConfig::from_toml("zone = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
