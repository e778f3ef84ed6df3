use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://pet-content-hub.github.io/pet-daily";

/// Which text-completion service writes the article body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Claude,
    Zhipu,
    Qwen,
    /// Bundled sample text, no network access
    Offline,
}

impl Provider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "claude" => Some(Provider::Claude),
            "zhipu" => Some(Provider::Zhipu),
            "qwen" => Some(Provider::Qwen),
            "offline" => Some(Provider::Offline),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
            Provider::Zhipu => "zhipu",
            Provider::Qwen => "qwen",
            Provider::Offline => "offline",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Claude => Some("CLAUDE_API_KEY"),
            Provider::Zhipu => Some("ZHIPU_API_KEY"),
            Provider::Qwen => Some("QWEN_API_KEY"),
            Provider::Offline => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ArticleLength {
    pub fn target_words(&self) -> &'static str {
        match self {
            ArticleLength::Short => "800-1200 words",
            ArticleLength::Medium => "1500-2000 words",
            ArticleLength::Long => "2500-3000 words",
        }
    }
}

/// Contents of `config.json`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub ai_provider: Provider,
    pub article_length: ArticleLength,
    pub articles_per_day: u32,
    pub output_dir: String,
    pub images_dir: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            ai_provider: Provider::default(),
            article_length: ArticleLength::default(),
            articles_per_day: 1,
            output_dir: "articles".to_string(),
            images_dir: "assets/images".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl SiteConfig {
    /// Read `config.json`, writing a starter file with the defaults if there is none
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let defaults = Self::default();
            let json = serde_json::to_string_pretty(&defaults)
                .context("Failed to serialize default configuration")?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write default config: {}", path.display()))?;
            info!(path = %path.display(), "wrote default configuration");
            return Ok(defaults);
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Everything a pipeline run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub site: SiteConfig,
    pub api_key: Option<String>,
}

impl Config {
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        Self::try_load_dotenv();

        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create site root: {}", root.display()))?;
        let site = SiteConfig::load_or_init(&root.join("config.json"))?;

        Ok(Self::new(root, site))
    }

    pub fn new(root: impl Into<PathBuf>, site: SiteConfig) -> Self {
        let api_key = Self::lookup_api_key(site.ai_provider);
        Self {
            root: root.into(),
            site,
            api_key,
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.site.ai_provider = provider;
        self.api_key = Self::lookup_api_key(provider);
        self
    }

    fn lookup_api_key(provider: Provider) -> Option<String> {
        provider
            .api_key_var()
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        let Some(var) = self.site.ai_provider.api_key_var() else {
            return Ok("");
        };
        self.api_key.as_deref().with_context(|| {
            format!(
                "{var} not found.\n\n\
                To fix this, create ~/.config/pet-daily/.env with:\n  \
                {var}=your_key_here\n\n\
                Or set \"ai_provider\": \"offline\" in config.json to generate sample articles."
            )
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.site.output_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(&self.site.images_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("articles.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join("used_topics.json")
    }

    pub fn feed_path(&self) -> PathBuf {
        self.root.join("feed.xml")
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.root.join("sitemap.xml")
    }

    /// Public site URL: the `CNAME` file wins, then `base_url` from config.json
    pub fn resolve_base_url(&self) -> Result<String> {
        let cname_path = self.root.join("CNAME");
        let from_cname = fs::read_to_string(&cname_path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|domain| format!("https://{}", domain));

        let base = match from_cname {
            Some(url) => {
                info!(base_url = %url, "using domain from CNAME");
                url
            }
            None if !self.site.base_url.trim().is_empty() => self.site.base_url.trim().to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };

        normalize_base_url(&base)
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/pet-daily/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("pet-daily").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Validate a site URL and strip any trailing slash
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).with_context(|| format!("Invalid base URL: {}", raw))?;
    if parsed.cannot_be_a_base() {
        anyhow::bail!("Base URL cannot be used for links: {}", raw);
    }
    Ok(raw.trim_end_matches('/').to_string())
}
