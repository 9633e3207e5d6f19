//! Configuration loading and validation.
//!
//! Configuration is layered with [`figment`], later layers overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional configuration file; the format is picked from the file
//!    extension (`.toml`, `.yaml`/`.yml` or `.json`).
//! 3. Environment variables prefixed with `SITEMAPPER_`, using `__` to
//!    separate nested keys (`SITEMAPPER_SITE__BASE_URL=https://example.com`).
//!
//! # Example
//!
//! ```toml
//! [site]
//! base_url = "https://example.com"
//! pretty_urls = true
//!
//! [sitemaps]
//! providers = ["posts", "taxonomies", "users"]
//! page_size = 2000
//! page_sizes = { users = 500 }
//! recompute_delay_secs = 10
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sitemap protocol limit on the number of URLs in a single sitemap document.
pub const MAX_PAGE_SIZE: u64 = 50_000;
pub const DEFAULT_PAGE_SIZE: u64 = 2_000;
const ENV_PREFIX: &str = "SITEMAPPER_";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub sitemaps: SitemapsConfig,
    pub cache: CacheConfig,
    pub source: SourceConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute URL of the site root, without a trailing slash.
    pub base_url: String,
    /// Whether the site can route pretty sitemap paths (`/sitemap-posts-post-1.xml`).
    /// When off, sitemap URLs fall back to query parameters.
    pub pretty_urls: bool,
}
impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            pretty_urls: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SitemapsConfig {
    /// Built-in providers to register, in index order.
    pub providers: Vec<String>,
    /// Maximum URLs per sitemap page.
    pub page_size: u64,
    /// Per-category overrides of [`page_size`](Self::page_size).
    pub page_sizes: BTreeMap<String, u64>,
    /// How long a lastmod recompute job waits before running.
    pub recompute_delay_secs: u64,
    /// Link the XSL stylesheets from rendered documents.
    pub stylesheets: bool,
    /// Remember pages that turned out to be empty instead of recomputing them
    /// on every render.
    pub cache_empty_pages: bool,
}
impl Default for SitemapsConfig {
    fn default() -> Self {
        Self {
            providers: vec!["posts".to_string(), "taxonomies".to_string(), "users".to_string()],
            page_size: DEFAULT_PAGE_SIZE,
            page_sizes: BTreeMap::new(),
            recompute_delay_secs: 10,
            stylesheets: true,
            cache_empty_pages: true,
        }
    }
}
impl SitemapsConfig {
    /// Page size for a category, falling back to the global default.
    pub fn page_size_for(&self, category: &str) -> u64 {
        self.page_sizes.get(category).copied().unwrap_or(self.page_size)
    }

    pub fn recompute_delay(&self) -> Duration {
        Duration::from_secs(self.recompute_delay_secs)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite database file. Defaults to the platform cache directory.
    pub path: Option<PathBuf>,
    /// Keep lastmod values in memory only.
    pub in_memory: bool,
}
impl CacheConfig {
    /// The database path to use, or `None` if no location could be determined
    /// (no configured path and no home directory).
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            ProjectDirs::from("", "", "sitemapper").map(|dirs| dirs.cache_dir().join("cache.sqlite"))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON content file read by the file-backed source.
    pub path: PathBuf,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("content.json") }
    }
}

impl Config {
    /// Build the layered [`Figment`] without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
            }
            figment = match file.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("toml") => figment.merge(Toml::file(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate configuration from defaults, an optional file and
    /// the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(file = ?file, base_url = %config.site.base_url, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.site.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            exn::bail!(ErrorKind::Invalid("site.base_url must be an absolute http(s) URL".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.sitemaps.page_size) {
            exn::bail!(ErrorKind::Invalid(format!("sitemaps.page_size must be between 1 and {MAX_PAGE_SIZE}")));
        }
        for (category, size) in &self.sitemaps.page_sizes {
            if !(1..=MAX_PAGE_SIZE).contains(size) {
                exn::bail!(ErrorKind::Invalid(format!(
                    "sitemaps.page_sizes.{category} must be between 1 and {MAX_PAGE_SIZE}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.sitemaps.providers, vec!["posts", "taxonomies", "users"]);
        assert_eq!(config.sitemaps.page_size_for("posts"), DEFAULT_PAGE_SIZE);
        assert_eq!(config.sitemaps.recompute_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_page_size_override() {
        let mut config = SitemapsConfig::default();
        config.page_sizes.insert("users".to_string(), 500);
        assert_eq!(config.page_size_for("users"), 500);
        assert_eq!(config.page_size_for("posts"), DEFAULT_PAGE_SIZE);
    }

    #[rstest]
    #[case("ftp://example.com", 2000)]
    #[case("example.com", 2000)]
    #[case("https://example.com", 0)]
    #[case("https://example.com", MAX_PAGE_SIZE + 1)]
    fn test_validate_rejects(#[case] base_url: &str, #[case] page_size: u64) {
        let mut config = Config::default();
        config.site.base_url = base_url.to_string();
        config.sitemaps.page_size = page_size;
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_category_override() {
        let mut config = Config::default();
        config.sitemaps.page_sizes.insert("posts".to_string(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "sitemapper.toml",
                r#"
                    [site]
                    base_url = "https://example.com"
                    pretty_urls = false

                    [sitemaps]
                    providers = ["posts"]
                    page_sizes = { posts = 100 }
                "#,
            )?;
            let config = Config::load(Some(Path::new("sitemapper.toml"))).unwrap();
            assert_eq!(config.site.base_url, "https://example.com");
            assert!(!config.site.pretty_urls);
            assert_eq!(config.sitemaps.providers, vec!["posts"]);
            assert_eq!(config.sitemaps.page_size_for("posts"), 100);
            // Untouched sections keep their defaults.
            assert_eq!(config.sitemaps.page_size, DEFAULT_PAGE_SIZE);
            assert_eq!(config.source, SourceConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file("sitemapper.yml", "site:\n  base_url: https://example.org\n")?;
            let config = Config::load(Some(Path::new("sitemapper.yml"))).unwrap();
            assert_eq!(config.site.base_url, "https://example.org");
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("sitemapper.json", r#"{"site": {"base_url": "https://file.example"}}"#)?;
            jail.set_env("SITEMAPPER_SITE__BASE_URL", "https://env.example");
            jail.set_env("SITEMAPPER_SITEMAPS__PAGE_SIZE", "250");
            let config = Config::load(Some(Path::new("sitemapper.json"))).unwrap();
            assert_eq!(config.site.base_url, "https://env.example");
            assert_eq!(config.sitemaps.page_size, 250);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("sitemapper.toml", "[sitemaps]\npage_size = 0\n")?;
            let err = Config::load(Some(Path::new("sitemapper.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_cache_path_override() {
        let config = CacheConfig {
            path: Some(PathBuf::from("/tmp/cache.sqlite")),
            in_memory: false,
        };
        assert_eq!(config.resolved_path(), Some(PathBuf::from("/tmp/cache.sqlite")));
    }
}
