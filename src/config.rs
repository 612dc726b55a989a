use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DOMAIN: &str = "https://elibrary.ru";
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Positions of the blocks of a publication page within the page's list of tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub identifiers: usize,
    pub title: usize,
    pub authors: usize,
    pub bibliographic: usize,
    pub source: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            identifiers: 22,
            title: 23,
            authors: 24,
            bibliographic: 25,
            source: 26,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Pause between consecutive fetches of a batch.
    pub delay_ms: u64,
    pub user_agent: String,
}

/// Resolved configuration handed to the extractor, formatter and fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prepended to every citation key.
    pub prefix: String,
    /// Site root used to build publication and author URLs from bare ids.
    pub domain: String,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub layout: Layout,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: String::new(),
            domain: DEFAULT_DOMAIN.to_string(),
            cache: CacheConfig {
                enabled: true,
                directory: None,
                ttl_hours: DEFAULT_TTL_HOURS,
            },
            http: HttpConfig {
                connect_timeout_secs: 10,
                timeout_secs: 30,
                delay_ms: 0,
                user_agent: format!(
                    "Mozilla/5.0 (compatible; elibib/{})",
                    env!("CARGO_PKG_VERSION")
                ),
            },
            layout: Layout::default(),
        }
    }
}

impl Config {
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("elibib")))
            .unwrap_or_else(|| PathBuf::from(".elibib-cache"))
    }

    fn apply(mut self, file: ConfigFile) -> Self {
        if let Some(p) = file.prefix {
            self.prefix = p;
        }
        if let Some(d) = file.domain {
            self.domain = d;
        }
        if let Some(c) = file.cache {
            if let Some(e) = c.enabled {
                self.cache.enabled = e;
            }
            if let Some(d) = c.directory {
                self.cache.directory = Some(PathBuf::from(d));
            }
            if let Some(t) = c.ttl_hours {
                self.cache.ttl_hours = t;
            }
        }
        if let Some(h) = file.http {
            if let Some(t) = h.connect_timeout_secs {
                self.http.connect_timeout_secs = t;
            }
            if let Some(t) = h.timeout_secs {
                self.http.timeout_secs = t;
            }
            if let Some(d) = h.delay_ms {
                self.http.delay_ms = d;
            }
            if let Some(ua) = h.user_agent {
                self.http.user_agent = ua;
            }
        }
        if let Some(l) = file.layout {
            self.layout = l;
        }
        self
    }
}

/// On-disk TOML configuration. Every field is optional so partial files work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub prefix: Option<String>,
    pub domain: Option<String>,
    pub cache: Option<CacheSection>,
    pub http: Option<HttpSection>,
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSection {
    pub enabled: Option<bool>,
    pub directory: Option<String>,
    pub ttl_hours: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpSection {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub delay_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Platform config file: `<config_dir>/elibib/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("elibib").join("config.toml"))
}

/// Parse one config file. Missing files are not an error, malformed ones are.
pub fn load_from_path(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let file = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(Some(file))
}

/// Build the configuration: defaults, then the platform file, then `./.elibib.toml`.
/// An explicit `path` replaces both files.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    if let Some(path) = path {
        let file = load_from_path(path)?
            .with_context(|| format!("config file {} does not exist", path.display()))?;
        tracing::debug!("using config file {}", path.display());
        return Ok(config.apply(file));
    }
    for candidate in config_path()
        .into_iter()
        .chain(std::iter::once(PathBuf::from(".elibib.toml")))
    {
        if let Some(file) = load_from_path(&candidate)? {
            tracing::debug!("using config file {}", candidate.display());
            config = config.apply(file);
        }
    }
    Ok(config)
}
