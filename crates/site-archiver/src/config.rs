use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::browser::Viewport;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4321";
/// Deliberately missing page, visited to exercise not-found handling.
pub const PROBE_PATH: &str = "/404-test";

const MM_PER_INCH: f64 = 25.4;

/// Complete run configuration. Every key has a default, so an empty TOML
/// file (or no file at all) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub site: SiteConfig,
    pub crawl: CrawlConfig,
    pub render: RenderConfig,
    pub browser: BrowserSettings,
    pub output: OutputConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(self.site.base_url.to_string()));
        }
        if self.site.seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    pub base_url: Url,
    pub seeds: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            seeds: vec!["/".to_string(), PROBE_PATH.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Neither visit nor enqueue bibliography ("sources") pages.
    pub skip_sources: bool,
    /// Stop loading pages once this many have been fetched.
    pub max_pages: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            skip_sources: true,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    pub settle_delay_ms: u64,
    pub scroll_step_px: u32,
    pub scroll_interval_ms: u64,
    /// Matched case-insensitively against button text.
    pub expand_phrases: Vec<String>,
    pub banner_label: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub layout: PageLayout,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            scroll_step_px: 100,
            scroll_interval_ms: 50,
            expand_phrases: vec!["expand all".to_string(), "rozwiń".to_string()],
            banner_label: "SITE ARCHIVE (BACKUP)".to_string(),
            viewport_width: 1280,
            viewport_height: 1600,
            layout: PageLayout::default(),
        }
    }
}

impl RenderConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport_width,
            height: self.viewport_height,
        }
    }
}

/// Paper size and margins for the printed page, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PageLayout {
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
    pub print_background: bool,
}

impl Default for PageLayout {
    // A4
    fn default() -> Self {
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            margin_top_mm: 20.0,
            margin_bottom_mm: 20.0,
            margin_left_mm: 15.0,
            margin_right_mm: 15.0,
            print_background: true,
        }
    }
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserSettings {
    pub navigation_timeout_ms: u64,
    /// Attach to an already running browser instead of launching one.
    pub websocket_url: Option<String>,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            websocket_url: None,
            headless: true,
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub path: PathBuf,
    pub compress: bool,
    /// Ghostscript executable used for composing and compressing.
    pub ghostscript: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("site-archive.pdf"),
            compress: true,
            ghostscript: "gs".to_string(),
        }
    }
}

impl OutputConfig {
    /// Where the uncompressed document goes while the compressor runs.
    pub fn raw_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.path.with_file_name(format!("{}.raw.pdf", stem))
    }
}
